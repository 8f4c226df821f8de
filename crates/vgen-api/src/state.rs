//! Application state.

use std::sync::Arc;

use vgen_mux::{MuxClient, MuxResult};
use vgen_tracker::AssetTracker;

use crate::config::ApiConfig;
use crate::services::ReadinessService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub tracker: AssetTracker,
    pub mux: Arc<MuxClient>,
    pub readiness: ReadinessService,
}

impl AppState {
    /// Create new application state with a Mux client built from the environment.
    pub fn new(config: ApiConfig) -> MuxResult<Self> {
        let mux = MuxClient::from_env()?;
        Ok(Self::with_mux_client(config, mux))
    }

    pub fn with_mux_client(config: ApiConfig, mux: MuxClient) -> Self {
        let tracker = AssetTracker::new(config.tracker.clone());
        let mux = Arc::new(mux);
        let readiness = ReadinessService::new(
            config.readiness_mode,
            tracker.clone(),
            mux.clone(),
            mux.clone(),
            config.poll.clone(),
        );

        Self {
            config,
            tracker,
            mux,
            readiness,
        }
    }
}
