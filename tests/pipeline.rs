// tests/pipeline.rs
//
// Pipeline-level tests with scripted fetchers: partial upstream failure,
// total failure, cross-source dedup, and merge ordering.

use std::sync::Arc;

use async_trait::async_trait;

use shortless::pipeline::build_feed;
use shortless::stats::ServiceStats;
use shortless::{FeedError, FeedFetcher, FeedSource, FilterPolicy};

const FIXTURE: &str = include_str!("fixtures/youtube_atom.xml");

// A second channel whose first entry shares a link with the main fixture
// (dedup case) and whose second entry is newer than everything else.
const SECOND_CHANNEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Second Channel</title>
  <entry>
    <id>yt:video:aaaaaaaaaa1</id>
    <yt:videoId>aaaaaaaaaa1</yt:videoId>
    <title>Building a disk scheduler from scratch</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=aaaaaaaaaa1"/>
    <author><name>Second Channel</name></author>
    <published>2024-03-01T10:00:00+00:00</published>
  </entry>
  <entry>
    <id>yt:video:eeeeeeeeee5</id>
    <yt:videoId>eeeeeeeeee5</yt:videoId>
    <title>Fresh upload from the second channel</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=eeeeeeeeee5"/>
    <author><name>Second Channel</name></author>
    <published>2024-03-05T08:00:00+00:00</published>
  </entry>
</feed>"#;

/// Routes by source label: `bad*` sources fail, `UCsecond` serves the
/// second channel, everything else serves the main fixture.
struct ScriptedFetcher;

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FeedError> {
        match source.label() {
            l if l.starts_with("bad") => {
                Err(FeedError::Fetch(format!("unreachable host for {l}")))
            }
            "UCsecond" => Ok(SECOND_CHANNEL.to_string()),
            _ => Ok(FIXTURE.to_string()),
        }
    }
}

fn channel(id: &str) -> FeedSource {
    FeedSource::ChannelId(id.to_string())
}

#[tokio::test]
async fn single_source_keeps_upstream_order() {
    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    let entries = build_feed(
        &[channel("UCfixture001")],
        Arc::new(ScriptedFetcher),
        &policy,
        &stats,
    )
    .await
    .expect("pipeline ok");

    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Building a disk scheduler from scratch", "Workshop tour"]
    );
}

#[tokio::test]
async fn merged_sources_dedup_by_link_and_sort_newest_first() {
    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    let entries = build_feed(
        &[channel("UCfixture001"), channel("UCsecond")],
        Arc::new(ScriptedFetcher),
        &policy,
        &stats,
    )
    .await
    .expect("pipeline ok");

    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    // the scheduler video appears once despite being in both feeds
    assert_eq!(
        titles,
        vec![
            "Fresh upload from the second channel", // 2024-03-05
            "Workshop tour",                        // 2024-03-04
            "Building a disk scheduler from scratch", // 2024-03-01
        ]
    );
}

#[tokio::test]
async fn one_failing_source_is_skipped_when_another_succeeds() {
    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    let entries = build_feed(
        &[channel("bad-upstream"), channel("UCfixture001")],
        Arc::new(ScriptedFetcher),
        &policy,
        &stats,
    )
    .await
    .expect("partial success still serves a feed");

    assert_eq!(entries.len(), 2);
    assert_eq!(stats.snapshot().errors, 1);
}

#[tokio::test]
async fn all_sources_failing_is_an_error_not_an_empty_feed() {
    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    let err = build_feed(
        &[channel("bad-one"), channel("bad-two")],
        Arc::new(ScriptedFetcher),
        &policy,
        &stats,
    )
    .await
    .expect_err("all sources down must not yield an empty feed");

    assert!(matches!(err, FeedError::Fetch(_)));
    assert_eq!(stats.snapshot().errors, 2);
}

#[tokio::test]
async fn fetch_and_parse_timings_reach_the_exposition() {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).expect("no other recorder in this binary");

    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    build_feed(
        &[channel("UCfixture001")],
        Arc::new(ScriptedFetcher),
        &policy,
        &stats,
    )
    .await
    .expect("pipeline ok");

    let text = handle.render();
    assert!(text.contains("feed_fetch_ms"), "{text}");
    assert!(text.contains("feed_parse_ms"), "{text}");
}

#[tokio::test]
async fn no_sources_is_a_config_error() {
    let stats = ServiceStats::new();
    let policy = FilterPolicy::defaults();
    let err = build_feed(&[], Arc::new(ScriptedFetcher), &policy, &stats)
        .await
        .expect_err("empty source list");
    assert!(matches!(err, FeedError::Config(_)));
}
