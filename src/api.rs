// src/api.rs
//! HTTP surface: the feed endpoint (plus aliases), liveness, stats, and a
//! small landing page. Liveness never touches the upstream, so a YouTube
//! outage cannot mark the service unhealthy.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::FeedError;
use crate::fetch::{FeedFetcher, FeedSource};
use crate::filter::FilterPolicy;
use crate::pipeline;
use crate::render;
use crate::stats::ServiceStats;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppConfig>,
    pub fetcher: Arc<dyn FeedFetcher>,
    pub policy: Arc<FilterPolicy>,
    pub stats: Arc<ServiceStats>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/rss", get(serve_feed))
        .route("/feed", get(serve_feed))
        .route("/atom", get(serve_feed))
        .route("/rss.xml", get(serve_feed))
        .route("/feed.xml", get(serve_feed))
        .route("/health", get(health))
        .route("/stats", get(service_stats))
        .fallback(not_found)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct FeedQuery {
    /// Comma-separated channel ids; overrides the configured defaults.
    channel_id: Option<String>,
    /// Comma-separated legacy usernames; overrides the configured defaults.
    user: Option<String>,
}

fn csv_sources(raw: &str, make: fn(String) -> FeedSource) -> impl Iterator<Item = FeedSource> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(move |s| make(s.to_string()))
}

fn requested_sources(cfg: &AppConfig, q: &FeedQuery) -> Vec<FeedSource> {
    let mut out = Vec::new();
    if let Some(ids) = &q.channel_id {
        out.extend(csv_sources(ids, FeedSource::ChannelId));
    }
    if let Some(users) = &q.user {
        out.extend(csv_sources(users, FeedSource::Username));
    }
    if out.is_empty() {
        cfg.default_sources()
    } else {
        out
    }
}

async fn serve_feed(
    State(state): State<AppState>,
    Query(q): Query<FeedQuery>,
) -> Result<Response, FeedError> {
    state.stats.record_request();

    let sources = requested_sources(&state.cfg, &q);
    let entries =
        pipeline::build_feed(&sources, Arc::clone(&state.fetcher), &state.policy, &state.stats)
            .await?;
    let body = render::render_atom(&entries, &state.cfg)
        .map_err(|e| FeedError::Internal(format!("serializing feed: {e}")))?;

    tracing::info!(entries = entries.len(), "serving filtered feed");

    Ok((
        [
            (header::CONTENT_TYPE, "application/atom+xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=900"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response())
}

/// Liveness probe: succeeds whenever the process can serve requests.
/// Performs no fetch or filter work.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snap = state.stats.snapshot();
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": snap.uptime_seconds,
        "configuration": {
            "channels_configured": state.cfg.channels.len(),
            "usernames_configured": state.cfg.usernames.len(),
            "max_short_duration": state.policy.max_short_duration,
            "strict_filter": state.policy.strict,
        },
        "statistics": snap,
    }))
}

async fn service_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snap = state.stats.snapshot();
    Json(json!({
        "requests": snap.requests,
        "videos_processed": snap.videos_processed,
        "shorts_filtered": snap.shorts_filtered,
        "errors": snap.errors,
        "filter_efficiency_percent": snap.filter_efficiency_percent,
        "uptime_seconds": snap.uptime_seconds,
        "configuration": {
            "youtube_channels": state.cfg.channels.len(),
            "youtube_usernames": state.cfg.usernames.len(),
            "max_short_duration": state.policy.max_short_duration,
            "include_duration": state.cfg.include_duration,
            "strict_filter": state.policy.strict,
            "enhanced_content": state.cfg.enhanced_content,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let snap = state.stats.snapshot();
    let base = &state.cfg.external_url;
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>shortless</title></head>
<body>
<h1>shortless</h1>
<p>A YouTube RSS feed with Shorts filtered out.</p>
<ul>
  <li><a href="{base}/rss">/rss</a> (aliases: /feed, /atom, /rss.xml, /feed.xml)</li>
  <li><a href="{base}/health">/health</a></li>
  <li><a href="{base}/stats">/stats</a></li>
  <li><a href="{base}/metrics">/metrics</a></li>
</ul>
<p>{channels} channel(s), {usernames} username(s) configured.
Served {requests} request(s); filtered {filtered} of {processed} video(s).</p>
</body>
</html>
"#,
        channels = state.cfg.channels.len(),
        usernames = state.cfg.usernames.len(),
        requests = snap.requests,
        filtered = snap.shorts_filtered,
        processed = snap.videos_processed,
    ))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested endpoint does not exist",
            "available_endpoints": [
                "/", "/rss", "/feed", "/atom", "/rss.xml", "/feed.xml",
                "/health", "/stats", "/metrics"
            ],
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with(channels: Vec<String>) -> AppConfig {
        AppConfig {
            channels,
            usernames: vec![],
            port: 5000,
            external_url: "http://localhost:5000".to_string(),
            fetch_timeout_secs: 10,
            include_duration: true,
            enhanced_content: true,
        }
    }

    #[test]
    fn query_overrides_configured_sources() {
        let cfg = cfg_with(vec!["UCdefault".to_string()]);
        let q = FeedQuery {
            channel_id: Some("UCa, UCb".to_string()),
            user: Some("carol".to_string()),
        };
        let sources = requested_sources(&cfg, &q);
        assert_eq!(
            sources,
            vec![
                FeedSource::ChannelId("UCa".to_string()),
                FeedSource::ChannelId("UCb".to_string()),
                FeedSource::Username("carol".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_falls_back_to_config() {
        let cfg = cfg_with(vec!["UCdefault".to_string()]);
        let sources = requested_sources(&cfg, &FeedQuery::default());
        assert_eq!(
            sources,
            vec![FeedSource::ChannelId("UCdefault".to_string())]
        );
    }
}
