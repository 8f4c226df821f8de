//! Mux webhook receiver.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use vgen_models::{ModelError, WebhookEvent};
use vgen_mux::{verify_webhook_signature, SIGNATURE_HEADER};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    fn received() -> Json<Self> {
        Json(Self { received: true })
    }
}

/// Receive a Mux webhook delivery.
///
/// Terminal asset events are forwarded to the tracker; everything else that
/// passes signature verification is acknowledged and ignored.
pub async fn mux_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let Some(secret) = state.config.mux_webhook_secret.as_deref() else {
        error!("Mux webhook secret is not configured");
        metrics::record_webhook("unconfigured");
        return Err(ApiError::internal("Webhook secret not configured"));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            metrics::record_webhook("rejected");
            ApiError::bad_request("Missing Mux-Signature header")
        })?;

    if let Err(e) = verify_webhook_signature(
        &body,
        signature,
        secret,
        state.config.webhook_tolerance,
        Utc::now().timestamp(),
    ) {
        warn!("Failed to verify Mux webhook signature: {}", e);
        metrics::record_webhook("rejected");
        return Err(e.into());
    }

    let event = WebhookEvent::from_slice(&body).map_err(|e| {
        metrics::record_webhook("rejected");
        ApiError::from(e)
    })?;
    let event_type = event.event_type().to_string();

    match event.into_asset_event() {
        Ok(Some(asset_event)) => {
            info!(
                event_type = %event_type,
                asset_id = %asset_event.asset_id(),
                "Received Mux asset event"
            );
            state.tracker.resolve(asset_event);
            metrics::record_webhook("resolved");
        }
        Ok(None) => {
            debug!(event_type = %event_type, "Ignoring Mux webhook event");
            metrics::record_webhook("ignored");
        }
        Err(ModelError::MalformedEvent(reason)) => {
            warn!(event_type = %event_type, "Received Mux asset event without an asset id: {}", reason);
            vgen_tracker::metrics::record_malformed_event();
            metrics::record_webhook("malformed");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(WebhookAck::received())
}
