// src/filter/mod.rs
//! Shorts classification and entry filtering.
//!
//! An entry is a Short when any of these fires:
//!   1. a keyword pattern matches its title or description;
//!   2. its declared duration (feed metadata, else a `[m:ss]` title tag)
//!      is at or below the policy threshold;
//!   3. strict mode only: a heuristic pattern matches.
//! Entries with no declared duration are NOT Shorts unless a pattern says so.

pub mod policy;

pub use policy::FilterPolicy;

use std::fmt;

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::feed::VideoEntry;

/// Why an entry was classified as a Short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortReason {
    Keyword,
    Duration(u64),
    StrictPattern,
}

impl fmt::Display for ShortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortReason::Keyword => write!(f, "contains shorts keywords"),
            ShortReason::Duration(secs) => write!(f, "declared duration {secs}s"),
            ShortReason::StrictPattern => write!(f, "strict mode pattern match"),
        }
    }
}

fn title_duration_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\[(\d{1,2}):(\d{2})\]").unwrap())
}

/// Duration in seconds from a `[m:ss]` tag in the title, if present.
pub fn extract_title_duration(title: &str) -> Option<u64> {
    let caps = title_duration_re().captures(title)?;
    let minutes: u64 = caps[1].parse().ok()?;
    let seconds: u64 = caps[2].parse().ok()?;
    Some(minutes * 60 + seconds)
}

/// Best available duration: feed metadata first, then the title tag.
pub fn declared_duration(entry: &VideoEntry) -> Option<u64> {
    entry
        .duration_secs
        .or_else(|| extract_title_duration(&entry.title))
}

pub fn classify(entry: &VideoEntry, policy: &FilterPolicy) -> Option<ShortReason> {
    if policy.matches_keyword(&entry.title) || policy.matches_keyword(&entry.description) {
        return Some(ShortReason::Keyword);
    }
    if let Some(secs) = declared_duration(entry) {
        if secs <= policy.max_short_duration {
            return Some(ShortReason::Duration(secs));
        }
    }
    if policy.strict
        && (policy.matches_strict(&entry.title) || policy.matches_strict(&entry.description))
    {
        return Some(ShortReason::StrictPattern);
    }
    None
}

/// Order-preserving strict subset of `entries` with Shorts removed.
pub fn filter_entries(entries: Vec<VideoEntry>, policy: &FilterPolicy) -> Vec<VideoEntry> {
    entries
        .into_iter()
        .filter(|e| match classify(e, policy) {
            Some(reason) => {
                tracing::debug!(title = %e.title, %reason, "filtered short");
                false
            }
            None => true,
        })
        .collect()
}

/// Prefix `title` with its duration (`[2m30s]` / `[45s]`) unless the title
/// already carries a `[m:ss]` tag.
pub fn prefix_duration(title: &str, duration_secs: Option<u64>) -> String {
    match duration_secs {
        Some(d) if !title_duration_re().is_match(title) => {
            let (minutes, seconds) = (d / 60, d % 60);
            if minutes > 0 {
                format!("[{minutes}m{seconds:02}s] {title}")
            } else {
                format!("[{seconds}s] {title}")
            }
        }
        _ => title.to_string(),
    }
}

/// YouTube video id from any of the common watch-URL shapes.
pub fn extract_video_id(url: &str) -> Option<String> {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    let res = RES.get_or_init(|| {
        [
            r"watch\?v=([a-zA-Z0-9_-]{11})",
            r"youtu\.be/([a-zA-Z0-9_-]{11})",
            r"embed/([a-zA-Z0-9_-]{11})",
            r"v/([a-zA-Z0-9_-]{11})",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });
    res.iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}
