//! Mux REST request/response types.

use serde::{Deserialize, Serialize};

use vgen_models::{AssetId, AssetSnapshot, PlaybackId};

/// Every Mux response wraps its payload in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Asset as returned by `GET /video/v1/assets/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxAsset {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub playback_ids: Vec<MuxPlaybackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<MuxAssetErrors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxPlaybackId {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuxAssetErrors {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl From<MuxAsset> for AssetSnapshot {
    fn from(asset: MuxAsset) -> Self {
        AssetSnapshot {
            id: AssetId::from(asset.id),
            status: asset.status,
            playback_id: asset
                .playback_ids
                .into_iter()
                .next()
                .map(|p| PlaybackId::from(p.id)),
            diagnostics: asset.errors.map(|e| e.messages).unwrap_or_default(),
        }
    }
}

/// Body of `POST /video/v1/assets`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssetRequest {
    pub inputs: Vec<AssetInput>,
    pub playback_policy: Vec<String>,
    pub video_quality: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetInput {
    pub url: String,
}

impl CreateAssetRequest {
    /// Public playback, basic quality.
    pub fn public_basic(source_url: impl Into<String>) -> Self {
        Self {
            inputs: vec![AssetInput {
                url: source_url.into(),
            }],
            playback_policy: vec!["public".to_string()],
            video_quality: "basic".to_string(),
        }
    }
}

/// Body of `POST /video/v1/assets/{id}/playback-ids`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaybackIdRequest {
    pub policy: String,
}

impl Default for CreatePlaybackIdRequest {
    fn default() -> Self {
        Self {
            policy: "public".to_string(),
        }
    }
}
