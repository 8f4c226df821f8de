//! Polling fallback.
//!
//! Used instead of the broker when webhook delivery is not configured or not
//! trusted. Reaches the same terminal states by querying the status
//! collaborator on an interval; never touches the broker's registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use vgen_models::{AssetId, AssetPhase, ReadyAsset};

use crate::config::PollConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::metrics;
use crate::source::{ensure_playback, AssetStatusSource, PlaybackProvisioner};

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Polls asset status until a terminal state or the deadline.
#[derive(Clone)]
pub struct AssetPoller {
    source: Arc<dyn AssetStatusSource>,
    provisioner: Arc<dyn PlaybackProvisioner>,
    config: PollConfig,
}

impl AssetPoller {
    pub fn new(
        source: Arc<dyn AssetStatusSource>,
        provisioner: Arc<dyn PlaybackProvisioner>,
        config: PollConfig,
    ) -> Self {
        Self {
            source,
            provisioner,
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll with the configured timeout.
    ///
    /// On success the returned asset always carries a playback id: a missing
    /// one is provisioned before returning.
    pub async fn wait_until_ready(&self, asset_id: &AssetId) -> TrackerResult<ReadyAsset> {
        self.wait_until_ready_with_timeout(asset_id, self.config.timeout)
            .await
    }

    pub async fn wait_until_ready_with_timeout(
        &self,
        asset_id: &AssetId,
        timeout: Duration,
    ) -> TrackerResult<ReadyAsset> {
        if asset_id.is_empty() {
            return Err(TrackerError::invalid_argument(
                "Cannot poll asset status without an asset id.",
            ));
        }

        let started = Instant::now();
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let mut last_status: Option<String> = None;
        let mut attempts = 0u32;

        info!(
            asset_id = %asset_id,
            interval_ms = self.config.interval.as_millis() as u64,
            timeout_ms = timeout.as_millis() as u64,
            "Polling asset status"
        );

        loop {
            attempts += 1;

            match tokio::time::timeout_at(deadline, self.source.fetch_status(asset_id)).await {
                Ok(Ok(snapshot)) => match snapshot.phase() {
                    AssetPhase::Ready => {
                        metrics::record_poll("ready");
                        let ready = ReadyAsset {
                            asset_id: asset_id.clone(),
                            playback_id: snapshot.playback_id,
                        };
                        let (asset_id, playback_id) =
                            ensure_playback(self.provisioner.as_ref(), ready).await?;

                        info!(asset_id = %asset_id, attempts, "Asset ready");
                        metrics::record_wait("polling", "ready", started.elapsed().as_secs_f64());
                        return Ok(ReadyAsset {
                            asset_id,
                            playback_id: Some(playback_id),
                        });
                    }
                    AssetPhase::Errored => {
                        metrics::record_poll("errored");
                        metrics::record_wait("polling", "errored", started.elapsed().as_secs_f64());
                        let reason = if snapshot.diagnostics.is_empty() {
                            format!("Mux asset {} failed while processing.", asset_id)
                        } else {
                            snapshot.diagnostics.join("; ")
                        };
                        warn!(asset_id = %asset_id, reason = %reason, "Asset errored");
                        return Err(TrackerError::processing_failed(asset_id, reason));
                    }
                    AssetPhase::Pending => {
                        metrics::record_poll("pending");
                        debug!(asset_id = %asset_id, status = %snapshot.status, attempts, "Asset still processing");
                        last_status = Some(snapshot.status);
                    }
                },
                Ok(Err(e)) => {
                    // Query failures are indistinguishable from a slow job
                    // here; they only consume the deadline.
                    metrics::record_poll("query_failed");
                    warn!(asset_id = %asset_id, attempts, "Asset status query failed: {}", e);
                }
                Err(_) => break,
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.config.interval.min(deadline - now)).await;
        }

        metrics::record_wait("polling", "timed_out", started.elapsed().as_secs_f64());
        warn!(
            asset_id = %asset_id,
            attempts,
            last_status = last_status.as_deref().unwrap_or("unknown"),
            "Timed out polling asset status"
        );
        Err(TrackerError::timed_out(asset_id, timeout, last_status))
    }
}
