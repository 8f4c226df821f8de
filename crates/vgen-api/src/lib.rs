//! Axum HTTP API for Mux asset readiness.
//!
//! This crate provides:
//! - The signed Mux webhook receiver feeding the readiness broker
//! - Asset status, ingest and wait-for-playback endpoints
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, ReadinessMode};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ReadinessService, ReadyPlayback};
pub use state::AppState;
