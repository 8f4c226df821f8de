//! Terminal asset events.

use serde::{Deserialize, Serialize};

use crate::{AssetId, PlaybackId};

/// Final outcome of an ingest job.
///
/// Once created an event is never mutated; it is handed to at most one
/// waiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetEvent {
    /// The asset is playable.
    Ready {
        asset_id: AssetId,
        /// First playback reference reported with the event, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        playback_id: Option<PlaybackId>,
    },
    /// The platform gave up on the asset.
    Errored { asset_id: AssetId, reason: String },
}

impl AssetEvent {
    pub fn ready(asset_id: impl Into<AssetId>, playback_id: Option<PlaybackId>) -> Self {
        Self::Ready {
            asset_id: asset_id.into(),
            playback_id,
        }
    }

    pub fn errored(asset_id: impl Into<AssetId>, reason: impl Into<String>) -> Self {
        Self::Errored {
            asset_id: asset_id.into(),
            reason: reason.into(),
        }
    }

    /// Asset this event is addressed to.
    pub fn asset_id(&self) -> &AssetId {
        match self {
            AssetEvent::Ready { asset_id, .. } | AssetEvent::Errored { asset_id, .. } => asset_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AssetEvent::Ready { .. } => "ready",
            AssetEvent::Errored { .. } => "errored",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetEvent::Ready { .. })
    }
}

/// A successfully processed asset, as reported to a waiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyAsset {
    pub asset_id: AssetId,
    /// `None` when the platform reported readiness without a playback id;
    /// callers provision one through the playback collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<PlaybackId>,
}
