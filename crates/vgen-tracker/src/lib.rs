//! Asset readiness tracking.
//!
//! This crate provides:
//! - `AssetTracker`: an in-memory broker that pairs webhook-delivered
//!   terminal events with callers waiting on the same asset, in either order
//! - `AssetPoller`: a polling fallback that reaches the same terminal states
//!   by querying a status collaborator on an interval
//! - `CachedEventSweeper`: background expiry of events nobody waited for

pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod source;
pub mod sweeper;
pub mod tracker;

pub use config::{PollConfig, TrackerConfig};
pub use error::{TrackerError, TrackerResult};
pub use poller::AssetPoller;
pub use source::{ensure_playback, AssetStatusSource, CollaboratorError, PlaybackProvisioner};
pub use sweeper::CachedEventSweeper;
pub use tracker::{AssetTracker, TrackerStats};
