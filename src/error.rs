// src/error.rs
//! Request-path error taxonomy. Startup-time failures use `anyhow` instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Everything that can go wrong while serving a single feed request.
/// Each class maps to a distinct HTTP status so callers can tell a dead
/// upstream from a garbled one.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Network failure, timeout, or non-2xx from the upstream feed host.
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    /// Upstream responded, but the document is not a parseable Atom feed.
    #[error("feed parse failed: {0}")]
    Parse(String),

    /// The request (or service configuration) names no usable feed source.
    #[error("invalid feed configuration: {0}")]
    Config(String),

    /// Serialization or other local failure; should not happen in practice.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = match &self {
            FeedError::Config(_) => StatusCode::BAD_REQUEST,
            FeedError::Fetch(_) => StatusCode::BAD_GATEWAY,
            FeedError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
