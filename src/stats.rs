// src/stats.rs
//! Process-wide service counters, mirrored into Prometheus series.
//! Plain atomics; no locking discipline is required anywhere else.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_requests_total", "Feed endpoint requests served.");
        describe_counter!(
            "videos_processed_total",
            "Entries parsed from upstream feeds."
        );
        describe_counter!(
            "shorts_filtered_total",
            "Entries removed by the Shorts classifier."
        );
        describe_counter!(
            "feed_errors_total",
            "Upstream fetch/parse failures and handler errors."
        );
        describe_histogram!("feed_fetch_ms", "Upstream feed fetch time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Atom document parse time in milliseconds.");
        describe_gauge!(
            "shorts_max_duration_secs",
            "Configured Shorts duration threshold."
        );
        describe_gauge!("strict_filter_enabled", "1 when strict mode is on.");
    });
}

/// Publish the active filter policy as static gauges.
pub fn set_policy_gauges(max_short_duration: u64, strict: bool) {
    ensure_metrics_described();
    gauge!("shorts_max_duration_secs").set(max_short_duration as f64);
    gauge!("strict_filter_enabled").set(if strict { 1.0 } else { 0.0 });
}

#[derive(Debug)]
pub struct ServiceStats {
    requests: AtomicU64,
    videos_processed: AtomicU64,
    shorts_filtered: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub videos_processed: u64,
    pub shorts_filtered: u64,
    pub errors: u64,
    pub filter_efficiency_percent: f64,
    pub uptime_seconds: u64,
}

impl ServiceStats {
    pub fn new() -> Self {
        ensure_metrics_described();
        Self {
            requests: AtomicU64::new(0),
            videos_processed: AtomicU64::new(0),
            shorts_filtered: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("feed_requests_total").increment(1);
    }

    pub fn add_processed(&self, n: u64) {
        self.videos_processed.fetch_add(n, Ordering::Relaxed);
        counter!("videos_processed_total").increment(n);
    }

    pub fn add_filtered(&self, n: u64) {
        self.shorts_filtered.fetch_add(n, Ordering::Relaxed);
        counter!("shorts_filtered_total").increment(n);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("feed_errors_total").increment(1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let processed = self.videos_processed.load(Ordering::Relaxed);
        let filtered = self.shorts_filtered.load(Ordering::Relaxed);
        let efficiency = if processed == 0 {
            0.0
        } else {
            (filtered as f64 / processed as f64 * 100.0 * 100.0).round() / 100.0
        };
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            videos_processed: processed,
            shorts_filtered: filtered,
            errors: self.errors.load(Ordering::Relaxed),
            filter_efficiency_percent: efficiency,
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}
