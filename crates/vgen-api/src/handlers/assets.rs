//! Asset handlers: status lookup, ingest, and waiting for playback.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use vgen_models::AssetId;

use crate::error::{ApiError, ApiResult};
use crate::services::ReadyPlayback;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssetStatusQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssetStatusResponse {
    pub id: String,
    pub status: String,
    pub ready: bool,
    pub playback_id: Option<String>,
    pub video_url: Option<String>,
}

/// Current status of an asset, straight from Mux.
pub async fn get_asset_status(
    State(state): State<AppState>,
    Query(query): Query<AssetStatusQuery>,
) -> ApiResult<Json<AssetStatusResponse>> {
    let id = query
        .id
        .map(AssetId::from)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("id is required"))?;

    let snapshot = state.mux.retrieve_asset(&id).await?;

    Ok(Json(AssetStatusResponse {
        id: id.to_string(),
        ready: snapshot.is_ready(),
        video_url: snapshot.playback_id.as_ref().map(|p| p.stream_url()),
        playback_id: snapshot.playback_id.map(|p| p.to_string()),
        status: snapshot.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub source_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAssetResponse {
    pub asset_id: AssetId,
    pub status: String,
}

fn validate_source_url(source_url: &str) -> ApiResult<Url> {
    let url = Url::parse(source_url.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid source_url: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ApiError::bad_request(format!(
            "Unsupported source_url scheme: {}",
            scheme
        ))),
    }
}

/// Start a Mux ingest job for a publicly reachable video.
pub async fn create_asset(
    State(state): State<AppState>,
    Json(request): Json<CreateAssetRequest>,
) -> ApiResult<(StatusCode, Json<CreateAssetResponse>)> {
    let source_url = validate_source_url(&request.source_url)?;

    let snapshot = state.mux.create_asset(source_url.as_str()).await?;
    info!(asset_id = %snapshot.id, "Started Mux ingest");

    Ok((
        StatusCode::CREATED,
        Json(CreateAssetResponse {
            asset_id: snapshot.id,
            status: snapshot.status,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct WaitQuery {
    pub timeout_secs: Option<u64>,
}

/// Block until the asset is playable, it fails, or the deadline passes.
pub async fn wait_for_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> ApiResult<Json<ReadyPlayback>> {
    let timeout = match query.timeout_secs {
        Some(0) => return Err(ApiError::bad_request("timeout_secs must be positive")),
        Some(secs) => Some(Duration::from_secs(secs).min(state.config.max_wait_timeout)),
        None => None,
    };

    let ready = state
        .readiness
        .wait_for_playback(&AssetId::from(asset_id), timeout)
        .await?;

    Ok(Json(ready))
}
