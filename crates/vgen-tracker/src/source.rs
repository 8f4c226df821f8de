//! External collaborators used to discover and finish readiness.

use async_trait::async_trait;
use tracing::info;

use vgen_models::{AssetId, AssetSnapshot, PlaybackId, ReadyAsset};

use crate::error::{TrackerError, TrackerResult};

/// Error returned by a collaborator. The tracker only reports it.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Queries the current status of an asset.
///
/// Implementations must be safe to call repeatedly (idempotent read).
#[async_trait]
pub trait AssetStatusSource: Send + Sync {
    async fn fetch_status(&self, asset_id: &AssetId) -> Result<AssetSnapshot, CollaboratorError>;
}

/// Provisions playback access for an asset that is ready.
///
/// Implementations must tolerate being called more than once for the same
/// asset, e.g. by returning an existing playback id.
#[async_trait]
pub trait PlaybackProvisioner: Send + Sync {
    async fn ensure_playback_id(&self, asset_id: &AssetId) -> Result<PlaybackId, CollaboratorError>;
}

/// Fill in a missing playback id on a ready asset.
pub async fn ensure_playback(
    provisioner: &dyn PlaybackProvisioner,
    ready: ReadyAsset,
) -> TrackerResult<(AssetId, PlaybackId)> {
    if let Some(playback_id) = ready.playback_id {
        return Ok((ready.asset_id, playback_id));
    }

    info!(asset_id = %ready.asset_id, "Asset ready without a playback id, provisioning one");

    let playback_id = provisioner
        .ensure_playback_id(&ready.asset_id)
        .await
        .map_err(|e| TrackerError::provisioning(&ready.asset_id, e.to_string()))?;

    Ok((ready.asset_id, playback_id))
}
