//! Axum HTTP API server.
//!
//! This crate provides:
//! - Live state queries (`GET /api/videos/{video_id}/live`)
//! - Prewarm triggers (`POST /api/videos/{video_id}/live/prime`)
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
