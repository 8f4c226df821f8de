//! Mux webhook payload shape.
//!
//! Only the fields the tracker needs are modeled; everything else in the
//! payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::{AssetEvent, AssetId, PlaybackId};

/// Event type sent when an asset becomes playable.
pub const ASSET_READY_EVENT: &str = "video.asset.ready";

/// Event type sent when asset processing fails.
pub const ASSET_ERRORED_EVENT: &str = "video.asset.errored";

/// Webhook envelope as delivered by Mux (after signature verification).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub data: Option<WebhookAssetData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookAssetData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub playback_ids: Option<Vec<WebhookPlaybackId>>,
    #[serde(default)]
    pub errors: Option<WebhookAssetErrors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPlaybackId {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookAssetErrors {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl WebhookEvent {
    /// Parse a raw (already verified) webhook body.
    pub fn from_slice(body: &[u8]) -> ModelResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or("")
    }

    /// Whether this is one of the terminal asset events.
    pub fn is_asset_terminal(&self) -> bool {
        matches!(self.event_type(), ASSET_READY_EVENT | ASSET_ERRORED_EVENT)
    }

    /// Convert into a terminal event.
    ///
    /// Returns `Ok(None)` for event types the tracker does not consume, and
    /// `MalformedEvent` for a terminal event with no asset id.
    pub fn into_asset_event(self) -> ModelResult<Option<AssetEvent>> {
        if !self.is_asset_terminal() {
            return Ok(None);
        }

        let event_type = self.event_type().to_string();
        let data = self.data.unwrap_or_default();
        let asset_id = match data.id.map(AssetId::from) {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(ModelError::malformed_event(format!(
                    "{} event without an asset id",
                    event_type
                )))
            }
        };

        let event = if event_type == ASSET_READY_EVENT {
            let playback_id = data
                .playback_ids
                .unwrap_or_default()
                .into_iter()
                .next()
                .map(|p| PlaybackId::from(p.id));
            AssetEvent::Ready {
                asset_id,
                playback_id,
            }
        } else {
            let messages = data.errors.map(|e| e.messages).unwrap_or_default();
            let reason = if messages.is_empty() {
                format!("Mux asset {} failed while processing.", asset_id)
            } else {
                messages.join("; ")
            };
            AssetEvent::Errored { asset_id, reason }
        };

        Ok(Some(event))
    }
}
