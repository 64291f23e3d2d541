// src/render.rs
//! Atom 1.0 serialization of the filtered feed. Output is always a valid
//! feed document; entry order is whatever the pipeline handed over.

use std::fmt::Write as _;

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::feed::VideoEntry;
use crate::filter;

const FEED_TITLE: &str = "YouTube RSS (No Shorts)";
const FEED_SUBTITLE: &str = "Filtered YouTube RSS feed without Shorts";
const GENERATOR: &str = "shortless";

/// Stable feed id derived from the public base URL.
fn feed_id(external_url: &str) -> String {
    let digest = Sha256::digest(external_url.as_bytes());
    let mut hex = String::with_capacity(32);
    for b in digest.iter().take(16) {
        let _ = write!(hex, "{b:02x}");
    }
    format!("urn:shortless:feed:{hex}")
}

/// Title as served: duration-prefixed when configured and known.
fn display_title(entry: &VideoEntry, cfg: &AppConfig) -> String {
    if cfg.include_duration {
        filter::prefix_duration(&entry.title, filter::declared_duration(entry))
    } else {
        entry.title.clone()
    }
}

/// HTML summary with a thumbnail and a watch link; falls back to the plain
/// description when no video id can be determined.
fn enhanced_summary(entry: &VideoEntry) -> String {
    let vid = entry
        .video_id
        .clone()
        .or_else(|| filter::extract_video_id(&entry.link));
    let Some(vid) = vid else {
        return entry.description.clone();
    };
    let thumb = entry
        .thumbnail
        .clone()
        .unwrap_or_else(|| format!("https://img.youtube.com/vi/{vid}/maxresdefault.jpg"));
    let title = html_escape::encode_text(&entry.title);
    let link = html_escape::encode_double_quoted_attribute(&entry.link);

    let mut out = format!(
        "<p><a href=\"{link}\" target=\"_blank\" rel=\"noopener\">\
<img src=\"{thumb}\" alt=\"Watch: {title}\" style=\"max-width:100%; height:auto;\"/>\
</a></p>\n<p><a href=\"{link}\" target=\"_blank\" rel=\"noopener\">\u{25B6} Watch on YouTube</a></p>"
    );
    if !entry.description.is_empty() {
        let _ = write!(
            out,
            "\n<div>{}</div>",
            html_escape::encode_text(&entry.description)
        );
    }
    out
}

fn text_el(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn link_el(w: &mut Writer<Vec<u8>>, href: &str, rel: &str, mime: &str) -> Result<()> {
    let mut link = BytesStart::new("link");
    link.push_attribute(("href", href));
    link.push_attribute(("rel", rel));
    link.push_attribute(("type", mime));
    w.write_event(Event::Empty(link))?;
    Ok(())
}

/// Serialize the filtered entries into an Atom 1.0 document.
pub fn render_atom(entries: &[VideoEntry], cfg: &AppConfig) -> Result<String> {
    let now = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let self_url = format!("{}/rss", cfg.external_url);

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", "http://www.w3.org/2005/Atom"));
    feed.push_attribute(("xml:lang", "en"));
    w.write_event(Event::Start(feed))?;

    text_el(&mut w, "title", FEED_TITLE)?;
    text_el(&mut w, "subtitle", FEED_SUBTITLE)?;
    text_el(&mut w, "id", &feed_id(&cfg.external_url))?;
    link_el(&mut w, &self_url, "self", "application/atom+xml")?;
    link_el(&mut w, &cfg.external_url, "alternate", "text/html")?;
    text_el(&mut w, "updated", &now)?;

    let mut generator = BytesStart::new("generator");
    generator.push_attribute(("uri", cfg.external_url.as_str()));
    generator.push_attribute(("version", env!("CARGO_PKG_VERSION")));
    w.write_event(Event::Start(generator))?;
    w.write_event(Event::Text(BytesText::new(GENERATOR)))?;
    w.write_event(Event::End(BytesEnd::new("generator")))?;

    w.write_event(Event::Start(BytesStart::new("author")))?;
    text_el(&mut w, "name", GENERATOR)?;
    text_el(&mut w, "uri", &cfg.external_url)?;
    w.write_event(Event::End(BytesEnd::new("author")))?;

    for entry in entries {
        let published = if entry.published.is_empty() {
            now.clone()
        } else {
            entry.published.clone()
        };
        let summary = if cfg.enhanced_content {
            enhanced_summary(entry)
        } else {
            entry.description.clone()
        };

        w.write_event(Event::Start(BytesStart::new("entry")))?;
        text_el(&mut w, "title", &display_title(entry, cfg))?;
        text_el(&mut w, "id", &entry.id)?;
        link_el(&mut w, &entry.link, "alternate", "text/html")?;
        text_el(&mut w, "published", &published)?;
        text_el(&mut w, "updated", &published)?;

        let mut summary_el = BytesStart::new("summary");
        summary_el.push_attribute(("type", "html"));
        w.write_event(Event::Start(summary_el))?;
        w.write_event(Event::Text(BytesText::new(&summary)))?;
        w.write_event(Event::End(BytesEnd::new("summary")))?;

        w.write_event(Event::Start(BytesStart::new("author")))?;
        text_el(&mut w, "name", &entry.author)?;
        w.write_event(Event::End(BytesEnd::new("author")))?;

        let mut category = BytesStart::new("category");
        category.push_attribute(("term", "video"));
        category.push_attribute(("label", "Video"));
        w.write_event(Event::Empty(category))?;

        w.write_event(Event::End(BytesEnd::new("entry")))?;
    }

    w.write_event(Event::End(BytesEnd::new("feed")))?;
    Ok(String::from_utf8(w.into_inner())?)
}
