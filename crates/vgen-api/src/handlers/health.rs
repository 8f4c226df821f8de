//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use vgen_tracker::TrackerStats;

use crate::config::ReadinessMode;
use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub readiness_mode: &'static str,
    pub webhook_secret_configured: bool,
    pub tracker: TrackerStats,
}

/// Readiness check endpoint (readiness probe).
///
/// Degraded when webhook mode is selected but no signing secret is set,
/// since no waiter could ever be resolved.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let mode = state.readiness.mode();
    let webhook_secret_configured = state.config.mux_webhook_secret.is_some();
    let ok = mode != ReadinessMode::Webhook || webhook_secret_configured;

    let response = ReadinessResponse {
        status: if ok { "ready" } else { "degraded" }.to_string(),
        readiness_mode: mode.as_str(),
        webhook_secret_configured,
        tracker: state.tracker.stats(),
    };

    if ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
