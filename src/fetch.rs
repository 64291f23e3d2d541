// src/fetch.rs
//! Upstream feed retrieval. The fetcher is a trait so the HTTP surface and
//! the pipeline can be exercised in tests without a live network call.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::FeedError;

const YOUTUBE_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";
const USER_AGENT: &str = concat!("shortless/", env!("CARGO_PKG_VERSION"));

/// Identifies one upstream feed. Immutable per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    ChannelId(String),
    Username(String),
    /// Direct feed URL, for non-channel feeds or tests.
    Url(String),
}

impl FeedSource {
    pub fn feed_url(&self) -> String {
        match self {
            FeedSource::ChannelId(id) => format!("{YOUTUBE_FEED_BASE}?channel_id={id}"),
            FeedSource::Username(user) => format!("{YOUTUBE_FEED_BASE}?user={user}"),
            FeedSource::Url(url) => url.clone(),
        }
    }

    /// Short identifier for logs and error messages.
    pub fn label(&self) -> &str {
        match self {
            FeedSource::ChannelId(id) => id,
            FeedSource::Username(user) => user,
            FeedSource::Url(url) => url,
        }
    }
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Retrieve the raw feed document for `source`. A transport error,
    /// timeout, or non-2xx status is a `FeedError::Fetch`; one attempt only.
    async fn fetch(&self, source: &FeedSource) -> Result<String, FeedError>;
}

/// Production fetcher backed by `reqwest` with a bounded timeout, so a hung
/// upstream cannot pin a worker indefinitely.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FeedError> {
        let url = source.feed_url();
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Fetch(format!("requesting {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Fetch(format!(
                "upstream returned {status} for {url}"
            )));
        }

        resp.text()
            .await
            .map_err(|e| FeedError::Fetch(format!("reading body from {url}: {e}")))
    }
}
