// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod stats;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::FeedError;
pub use crate::fetch::{FeedFetcher, FeedSource, HttpFetcher};
pub use crate::filter::FilterPolicy;
