// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health (liveness is independent of upstream availability)
// - GET /rss and its aliases (filtering, headers)
// - error mapping: 400 / 502 / 422
// - GET /stats and the JSON 404 fallback

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use shortless::config::AppConfig;
use shortless::stats::ServiceStats;
use shortless::{api, AppState, FeedError, FeedFetcher, FeedSource, FilterPolicy};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests
const FIXTURE: &str = include_str!("fixtures/youtube_atom.xml");

struct FixtureFetcher;

#[async_trait]
impl FeedFetcher for FixtureFetcher {
    async fn fetch(&self, _source: &FeedSource) -> Result<String, FeedError> {
        Ok(FIXTURE.to_string())
    }
}

struct FailingFetcher;

#[async_trait]
impl FeedFetcher for FailingFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FeedError> {
        Err(FeedError::Fetch(format!(
            "connect timeout for {}",
            source.label()
        )))
    }
}

struct GarbageFetcher;

#[async_trait]
impl FeedFetcher for GarbageFetcher {
    async fn fetch(&self, _source: &FeedSource) -> Result<String, FeedError> {
        Ok("<<< definitely not a feed".to_string())
    }
}

fn test_cfg(channels: &[&str]) -> AppConfig {
    AppConfig {
        channels: channels.iter().map(|s| s.to_string()).collect(),
        usernames: vec![],
        port: 5000,
        external_url: "http://localhost:5000".to_string(),
        fetch_timeout_secs: 10,
        include_duration: true,
        enhanced_content: true,
    }
}

fn test_router(fetcher: Arc<dyn FeedFetcher>, channels: &[&str]) -> Router {
    let state = AppState {
        cfg: Arc::new(test_cfg(channels)),
        fetcher,
        policy: Arc::new(FilterPolicy::defaults()),
        stats: Arc::new(ServiceStats::new()),
    };
    api::router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, headers, bytes)
}

#[tokio::test]
async fn health_is_200_even_when_upstream_is_unreachable() {
    let app = test_router(Arc::new(FailingFetcher), &["UCfixture001"]);
    let (status, _, bytes) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK, "liveness must not depend on upstream");

    let v: Json = serde_json::from_slice(&bytes).expect("parse health json");
    assert_eq!(v["status"], "healthy");
    assert!(v.get("configuration").is_some(), "missing 'configuration'");
    assert!(v.get("statistics").is_some(), "missing 'statistics'");
}

#[tokio::test]
async fn rss_serves_filtered_atom_with_headers() {
    let app = test_router(Arc::new(FixtureFetcher), &["UCfixture001"]);
    let (status, headers, bytes) = get(app, "/rss").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("content-type").and_then(|h| h.to_str().ok()),
        Some("application/atom+xml; charset=utf-8")
    );
    assert_eq!(
        headers.get("cache-control").and_then(|h| h.to_str().ok()),
        Some("public, max-age=900")
    );

    let xml = String::from_utf8(bytes).expect("utf8");
    assert!(xml.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\""));
    // the hour-long video and the plain upload survive
    assert!(xml.contains("Building a disk scheduler from scratch"));
    assert!(xml.contains("Workshop tour"));
    // the keyword short and the 45s teaser are gone
    assert!(!xml.contains("#shorts compilation"));
    assert!(!xml.contains("Teaser for Friday"));
}

#[tokio::test]
async fn feed_aliases_serve_the_same_document() {
    for uri in ["/feed", "/atom", "/rss.xml", "/feed.xml"] {
        let app = test_router(Arc::new(FixtureFetcher), &["UCfixture001"]);
        let (status, _, bytes) = get(app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        let xml = String::from_utf8(bytes).expect("utf8");
        assert!(xml.contains("Building a disk scheduler"), "{uri}");
    }
}

#[tokio::test]
async fn query_params_override_configured_channels() {
    // no channels configured; the query supplies one
    let app = test_router(Arc::new(FixtureFetcher), &[]);
    let (status, _, bytes) = get(app, "/rss?channel_id=UCquery001").await;
    assert_eq!(status, StatusCode::OK);
    let xml = String::from_utf8(bytes).expect("utf8");
    assert!(xml.contains("Workshop tour"));
}

#[tokio::test]
async fn missing_sources_map_to_400() {
    let app = test_router(Arc::new(FixtureFetcher), &[]);
    let (status, _, _) = get(app, "/rss").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetch_failure_maps_to_502_not_an_empty_feed() {
    let app = test_router(Arc::new(FailingFetcher), &["UCfixture001"]);
    let (status, _, bytes) = get(app, "/rss").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body = String::from_utf8(bytes).expect("utf8");
    assert!(body.contains("fetch failed"), "human-readable message: {body}");
}

#[tokio::test]
async fn malformed_upstream_maps_to_422() {
    let app = test_router(Arc::new(GarbageFetcher), &["UCfixture001"]);
    let (status, _, bytes) = get(app, "/rss").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = String::from_utf8(bytes).expect("utf8");
    assert!(body.contains("parse failed"), "human-readable message: {body}");
}

#[tokio::test]
async fn stats_reflect_served_requests() {
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(FixtureFetcher);
    let state = AppState {
        cfg: Arc::new(test_cfg(&["UCfixture001"])),
        fetcher,
        policy: Arc::new(FilterPolicy::defaults()),
        stats: Arc::new(ServiceStats::new()),
    };
    let app = api::router(state);

    let (status, _, _) = get(app.clone(), "/rss").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, bytes) = get(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&bytes).expect("parse stats json");
    assert_eq!(v["requests"], 1);
    assert_eq!(v["videos_processed"], 4);
    assert_eq!(v["shorts_filtered"], 2);
    assert_eq!(v["filter_efficiency_percent"], 50.0);
    assert!(v.get("configuration").is_some());
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = test_router(Arc::new(FixtureFetcher), &["UCfixture001"]);
    let (status, _, bytes) = get(app, "/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let v: Json = serde_json::from_slice(&bytes).expect("parse 404 json");
    assert_eq!(v["error"], "Not Found");
    assert!(v["available_endpoints"].is_array());
}

#[tokio::test]
async fn landing_page_lists_feed_links() {
    let app = test_router(Arc::new(FixtureFetcher), &["UCfixture001"]);
    let (status, _, bytes) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).expect("utf8");
    assert!(html.contains("/rss"));
    assert!(html.contains("/health"));
}
