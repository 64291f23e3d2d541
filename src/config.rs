// src/config.rs
//! Service configuration, resolved once at startup from the environment
//! (after `dotenvy` has loaded any local `.env`). Handlers receive the
//! resulting value explicitly; nothing reads env vars per request.

use anyhow::{Context, Result};

use crate::fetch::FeedSource;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub const ENV_CHANNELS: &str = "YOUTUBE_CHANNELS";
pub const ENV_USERNAMES: &str = "YOUTUBE_USERNAMES";
pub const ENV_PORT: &str = "PORT";
pub const ENV_EXTERNAL_URL: &str = "EXTERNAL_URL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_INCLUDE_DURATION: &str = "INCLUDE_DURATION";
pub const ENV_ENHANCED_CONTENT: &str = "ENHANCED_CONTENT";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Channel ids monitored by default (overridable per request via query).
    pub channels: Vec<String>,
    /// Legacy usernames monitored by default.
    pub usernames: Vec<String>,
    pub port: u16,
    /// Public base URL used for self/alternate links in the output feed.
    pub external_url: String,
    pub fetch_timeout_secs: u64,
    /// Prefix kept titles with their duration, e.g. `[2m30s]`.
    pub include_duration: bool,
    /// Replace entry summaries with thumbnail + watch-link HTML.
    pub enhanced_content: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var(ENV_PORT) {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("parsing {ENV_PORT}='{raw}'"))?,
            Err(_) => DEFAULT_PORT,
        };

        let fetch_timeout_secs = match std::env::var(ENV_FETCH_TIMEOUT_SECS) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("parsing {ENV_FETCH_TIMEOUT_SECS}='{raw}'"))?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let external_url = std::env::var(ENV_EXTERNAL_URL)
            .ok()
            .map(|u| ensure_scheme(u.trim()))
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self {
            channels: csv_env(ENV_CHANNELS),
            usernames: csv_env(ENV_USERNAMES),
            port,
            external_url,
            fetch_timeout_secs,
            include_duration: bool_env(ENV_INCLUDE_DURATION, true),
            enhanced_content: bool_env(ENV_ENHANCED_CONTENT, true),
        })
    }

    /// Default feed sources for requests that don't name a channel themselves.
    pub fn default_sources(&self) -> Vec<FeedSource> {
        let mut out = Vec::with_capacity(self.channels.len() + self.usernames.len());
        out.extend(self.channels.iter().cloned().map(FeedSource::ChannelId));
        out.extend(self.usernames.iter().cloned().map(FeedSource::Username));
        out
    }
}

fn csv_env(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn bool_env(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
