// src/pipeline.rs
//! Per-request orchestration: fetch every requested source concurrently,
//! parse, filter, then merge. Constructed fresh per request; nothing here
//! survives the response.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::histogram;
use tokio::task::JoinSet;

use crate::error::FeedError;
use crate::feed::{self, VideoEntry};
use crate::fetch::{FeedFetcher, FeedSource};
use crate::filter::{self, FilterPolicy};
use crate::stats::ServiceStats;

/// Fetch, parse, and filter all `sources` into one entry list.
///
/// A failing source is logged and skipped as long as at least one source
/// succeeds; when every source fails the first error propagates, so the
/// caller never serves a silently empty feed.
pub async fn build_feed(
    sources: &[FeedSource],
    fetcher: Arc<dyn FeedFetcher>,
    policy: &FilterPolicy,
    stats: &ServiceStats,
) -> Result<Vec<VideoEntry>, FeedError> {
    if sources.is_empty() {
        return Err(FeedError::Config(
            "no feed source: set YOUTUBE_CHANNELS / YOUTUBE_USERNAMES \
             or pass ?channel_id= / ?user="
                .to_string(),
        ));
    }

    let mut set = JoinSet::new();
    for source in sources.iter().cloned() {
        let fetcher = Arc::clone(&fetcher);
        set.spawn(async move {
            let t0 = std::time::Instant::now();
            let res = fetcher.fetch(&source).await;
            histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            (source, res)
        });
    }

    let mut kept: Vec<VideoEntry> = Vec::new();
    let mut first_err: Option<FeedError> = None;
    let mut ok_sources = 0usize;

    while let Some(joined) = set.join_next().await {
        let (source, fetched) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "fetch task failed to join");
                stats.record_error();
                first_err.get_or_insert(FeedError::Internal(e.to_string()));
                continue;
            }
        };

        let parsed = fetched.and_then(|xml| {
            let t0 = std::time::Instant::now();
            let res = feed::parse_feed(&xml);
            histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            res
        });
        match parsed {
            Ok(channel) => {
                ok_sources += 1;
                let total = channel.entries.len();
                let filtered = filter::filter_entries(channel.entries, policy);
                let removed = total - filtered.len();
                stats.add_processed(total as u64);
                stats.add_filtered(removed as u64);
                tracing::info!(
                    source = source.label(),
                    total,
                    removed,
                    "feed source processed"
                );
                kept.extend(filtered);
            }
            Err(e) => {
                tracing::warn!(source = source.label(), error = %e, "feed source failed");
                stats.record_error();
                first_err.get_or_insert(e);
            }
        }
    }

    if ok_sources == 0 {
        return Err(
            first_err.unwrap_or_else(|| FeedError::Fetch("all feed sources failed".to_string()))
        );
    }

    // Dedup by link across sources.
    let mut seen: HashSet<String> = HashSet::new();
    kept.retain(|e| seen.insert(e.link.clone()));

    // A single feed keeps its upstream order untouched; a merged multi-source
    // feed is ordered newest first (stable, so ties keep source order).
    if sources.len() > 1 {
        kept.sort_by(|a, b| b.published_unix.cmp(&a.published_unix));
    }

    Ok(kept)
}
