// src/feed.rs
//! YouTube Atom feed parsing via quick-xml serde. Entries are read-only once
//! parsed; downstream stages include or exclude them, never mutate in place.

use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::FeedError;

/// One parsed feed item, carrying the raw metadata the classifier needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub author: String,
    /// Original RFC 3339 timestamp string, echoed into the output feed.
    pub published: String,
    /// `published` as unix seconds (0 when missing or unparseable).
    pub published_unix: u64,
    pub description: String,
    pub video_id: Option<String>,
    pub thumbnail: Option<String>,
    /// Duration declared in feed metadata, if the upstream provides one.
    pub duration_secs: Option<u64>,
}

/// A parsed channel feed: ordered entries plus the channel title.
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    pub title: String,
    pub entries: Vec<VideoEntry>,
}

// --- raw deserialization schema ---
// quick-xml's deserializer reports local element names with the namespace
// prefix stripped, so the yt:/media: fields rename to their local names.

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<String>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    published: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    author: Option<AtomAuthor>,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    #[serde(rename = "group")]
    media: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaGroup {
    description: Option<String>,
    #[serde(rename = "thumbnail", default)]
    thumbnails: Vec<MediaThumbnail>,
    #[serde(rename = "content", default)]
    contents: Vec<MediaContent>,
}

#[derive(Debug, Deserialize)]
struct MediaThumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaContent {
    #[serde(rename = "@duration")]
    duration: Option<u64>,
}

fn parse_rfc3339_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// Parse a raw Atom document into a `ChannelFeed`. Malformed XML, or a
/// well-formed document that is clearly not a feed, yields `FeedError::Parse`.
pub fn parse_feed(xml: &str) -> Result<ChannelFeed, FeedError> {
    let raw: AtomFeed =
        from_str(xml).map_err(|e| FeedError::Parse(format!("malformed atom document: {e}")))?;

    // A feed with neither a title nor entries is some other XML document
    // that happened to parse; flag it rather than serving an empty feed.
    if raw.title.is_none() && raw.entries.is_empty() {
        return Err(FeedError::Parse(
            "document has no feed title and no entries".to_string(),
        ));
    }

    let entries = raw
        .entries
        .into_iter()
        .map(|e| {
            let link = e
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                .and_then(|l| l.href.clone())
                .unwrap_or_default();
            let media = e.media;
            let published = e.published.unwrap_or_default();
            VideoEntry {
                id: e.id.unwrap_or_else(|| link.clone()),
                title: e.title.unwrap_or_default(),
                link,
                author: e
                    .author
                    .and_then(|a| a.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                published_unix: parse_rfc3339_to_unix(&published),
                published,
                description: media
                    .as_ref()
                    .and_then(|m| m.description.clone())
                    .unwrap_or_default(),
                video_id: e.video_id,
                thumbnail: media
                    .as_ref()
                    .and_then(|m| m.thumbnails.first())
                    .and_then(|t| t.url.clone()),
                duration_secs: media
                    .as_ref()
                    .and_then(|m| m.contents.iter().find_map(|c| c.duration)),
            }
        })
        .collect();

    Ok(ChannelFeed {
        title: raw.title.unwrap_or_default(),
        entries,
    })
}
