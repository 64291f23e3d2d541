//! shortless — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shortless::api::{self, AppState};
use shortless::config::AppConfig;
use shortless::fetch::HttpFetcher;
use shortless::filter::FilterPolicy;
use shortless::stats::{self, ServiceStats};
use shortless::telemetry;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shortless=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env().context("loading service configuration")?;
    let policy = FilterPolicy::load().context("loading shorts filter policy")?;

    if cfg.channels.is_empty() && cfg.usernames.is_empty() {
        tracing::warn!(
            "no YouTube channels or usernames configured; \
             requests must pass ?channel_id= or ?user="
        );
    }
    tracing::info!(
        channels = cfg.channels.len(),
        usernames = cfg.usernames.len(),
        max_short_duration = policy.max_short_duration,
        strict = policy.strict,
        external_url = %cfg.external_url,
        "starting shortless"
    );

    let prometheus = telemetry::install_recorder();
    stats::set_policy_gauges(policy.max_short_duration, policy.strict);
    let fetcher = HttpFetcher::new(&cfg).context("building feed fetcher")?;

    let port = cfg.port;
    let state = AppState {
        cfg: Arc::new(cfg),
        fetcher: Arc::new(fetcher),
        policy: Arc::new(policy),
        stats: Arc::new(ServiceStats::new()),
    };
    let app = api::router(state).merge(telemetry::exposition_router(prometheus));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
