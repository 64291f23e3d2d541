// src/telemetry.rs
//! Prometheus wiring. The recorder is installed once at startup; everything
//! else in the crate records through the `metrics` facade and shows up on
//! the exposition endpoint.

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the process-global Prometheus recorder. Must run before the first
/// counter is touched; a second install is a startup bug, so it panics.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus: install recorder")
}

/// `/metrics` in Prometheus text exposition format, rendered from `handle`.
pub fn exposition_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}
