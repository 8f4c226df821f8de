//! Shared data models for the VGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Asset and playback identifiers
//! - Terminal asset events (ready / errored)
//! - The Mux webhook payload shape
//! - Asset status snapshots used by the polling fallback

pub mod asset;
pub mod error;
pub mod event;
pub mod status;
pub mod webhook;

// Re-export common types
pub use asset::{AssetId, PlaybackId};
pub use error::{ModelError, ModelResult};
pub use event::{AssetEvent, ReadyAsset};
pub use status::{AssetPhase, AssetSnapshot};
pub use webhook::{
    WebhookAssetData, WebhookAssetErrors, WebhookEvent, WebhookPlaybackId, ASSET_ERRORED_EVENT,
    ASSET_READY_EVENT,
};
