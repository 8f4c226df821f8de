//! Readiness service.
//!
//! Turns an asset id into a playable stream, either by waiting on the
//! webhook-fed broker or by polling Mux, depending on `ReadinessMode`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use vgen_models::{AssetId, PlaybackId};
use vgen_tracker::{
    ensure_playback, AssetPoller, AssetStatusSource, AssetTracker, PlaybackProvisioner, PollConfig,
    TrackerResult,
};

use crate::config::ReadinessMode;

/// A ready asset with its playback reference and stream URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadyPlayback {
    pub asset_id: AssetId,
    pub playback_id: PlaybackId,
    pub stream_url: String,
}

impl ReadyPlayback {
    fn new(asset_id: AssetId, playback_id: PlaybackId) -> Self {
        let stream_url = playback_id.stream_url();
        Self {
            asset_id,
            playback_id,
            stream_url,
        }
    }
}

#[derive(Clone)]
pub struct ReadinessService {
    mode: ReadinessMode,
    tracker: AssetTracker,
    poller: AssetPoller,
    provisioner: Arc<dyn PlaybackProvisioner>,
}

impl ReadinessService {
    pub fn new(
        mode: ReadinessMode,
        tracker: AssetTracker,
        source: Arc<dyn AssetStatusSource>,
        provisioner: Arc<dyn PlaybackProvisioner>,
        poll_config: PollConfig,
    ) -> Self {
        let poller = AssetPoller::new(source, Arc::clone(&provisioner), poll_config);
        Self {
            mode,
            tracker,
            poller,
            provisioner,
        }
    }

    pub fn mode(&self) -> ReadinessMode {
        self.mode
    }

    /// Default deadline for the active mode.
    pub fn default_timeout(&self) -> Duration {
        match self.mode {
            ReadinessMode::Webhook => self.tracker.config().wait_timeout,
            ReadinessMode::Polling => self.poller.config().timeout,
        }
    }

    /// Wait until the asset is playable.
    ///
    /// A ready asset without a playback id gets one provisioned before
    /// returning, on either path.
    pub async fn wait_for_playback(
        &self,
        asset_id: &AssetId,
        timeout: Option<Duration>,
    ) -> TrackerResult<ReadyPlayback> {
        let timeout = timeout.unwrap_or_else(|| self.default_timeout());

        info!(asset_id = %asset_id, mode = %self.mode, timeout_ms = timeout.as_millis() as u64, "Waiting for asset playback");

        let ready = match self.mode {
            ReadinessMode::Webhook => self.tracker.wait_with_timeout(asset_id, timeout).await?,
            ReadinessMode::Polling => {
                self.poller
                    .wait_until_ready_with_timeout(asset_id, timeout)
                    .await?
            }
        };

        let (asset_id, playback_id) = ensure_playback(self.provisioner.as_ref(), ready).await?;
        Ok(ReadyPlayback::new(asset_id, playback_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use vgen_models::{AssetEvent, AssetSnapshot};
    use vgen_tracker::{CollaboratorError, TrackerError};

    struct StubMux {
        status: &'static str,
        provisioned: AtomicU32,
    }

    #[async_trait]
    impl AssetStatusSource for StubMux {
        async fn fetch_status(&self, asset_id: &AssetId) -> Result<AssetSnapshot, CollaboratorError> {
            Ok(AssetSnapshot::new(asset_id.clone(), self.status))
        }
    }

    #[async_trait]
    impl PlaybackProvisioner for StubMux {
        async fn ensure_playback_id(&self, _asset_id: &AssetId) -> Result<PlaybackId, CollaboratorError> {
            self.provisioned.fetch_add(1, Ordering::SeqCst);
            Ok(PlaybackId::from("pb_new"))
        }
    }

    fn service(mode: ReadinessMode, status: &'static str) -> (ReadinessService, AssetTracker, Arc<StubMux>) {
        let tracker = AssetTracker::default();
        let mux = Arc::new(StubMux {
            status,
            provisioned: AtomicU32::new(0),
        });
        let service = ReadinessService::new(
            mode,
            tracker.clone(),
            mux.clone(),
            mux.clone(),
            PollConfig::new(Duration::from_millis(5), Duration::from_millis(200)),
        );
        (service, tracker, mux)
    }

    #[tokio::test]
    async fn test_webhook_mode_uses_broker() {
        let (service, tracker, mux) = service(ReadinessMode::Webhook, "preparing");
        tracker.resolve(AssetEvent::ready("a1", Some(PlaybackId::from("pb_x"))));

        let ready = service
            .wait_for_playback(&AssetId::from("a1"), None)
            .await
            .unwrap();

        assert_eq!(ready.playback_id.as_str(), "pb_x");
        assert_eq!(ready.stream_url, "https://stream.mux.com/pb_x.m3u8");
        assert_eq!(mux.provisioned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_webhook_ready_without_playback_is_provisioned() {
        let (service, tracker, mux) = service(ReadinessMode::Webhook, "preparing");
        tracker.resolve(AssetEvent::ready("a1", None));

        let ready = tokio_test::assert_ok!(
            service.wait_for_playback(&AssetId::from("a1"), None).await
        );
        assert_eq!(ready.playback_id.as_str(), "pb_new");
        assert_eq!(mux.provisioned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_polling_mode_ignores_broker() {
        let (service, tracker, _mux) = service(ReadinessMode::Polling, "preparing");
        tracker.resolve(AssetEvent::ready("a1", Some(PlaybackId::from("pb_x"))));

        let err = tokio_test::assert_err!(
            service
                .wait_for_playback(&AssetId::from("a1"), Some(Duration::from_millis(30)))
                .await
        );
        assert!(matches!(err, TrackerError::WaitTimedOut { .. }));
        assert_eq!(tracker.stats().cached_events, 1);
    }

    #[tokio::test]
    async fn test_polling_mode_ready() {
        let (service, _tracker, mux) = service(ReadinessMode::Polling, "ready");

        let ready = service
            .wait_for_playback(&AssetId::from("a1"), None)
            .await
            .unwrap();
        assert_eq!(ready.playback_id.as_str(), "pb_new");
        assert_eq!(mux.provisioned.load(Ordering::SeqCst), 1);
    }
}
