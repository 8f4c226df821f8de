//! Tracker error types.

use std::time::Duration;

use thiserror::Error;
use vgen_models::AssetId;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform reported a failure. Only retrying the whole job helps.
    #[error("Mux asset {asset_id} failed while processing: {reason}")]
    AssetProcessingFailed { asset_id: AssetId, reason: String },

    /// No terminal state within the deadline. The caller may wait again or
    /// fall back to polling.
    #[error(
        "Timed out after {}ms waiting for Mux asset {asset_id} to become ready{}",
        .timeout.as_millis(),
        last_status_suffix(.last_status)
    )]
    WaitTimedOut {
        asset_id: AssetId,
        timeout: Duration,
        last_status: Option<String>,
    },

    #[error("Already waiting for asset {0}")]
    AlreadyWaiting(AssetId),

    #[error("Playback provisioning failed for asset {asset_id}: {message}")]
    Provisioning { asset_id: AssetId, message: String },
}

fn last_status_suffix(last_status: &Option<String>) -> String {
    match last_status {
        Some(status) => format!(" (last status: {})", status),
        None => String::new(),
    }
}

impl TrackerError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn processing_failed(asset_id: &AssetId, reason: impl Into<String>) -> Self {
        Self::AssetProcessingFailed {
            asset_id: asset_id.clone(),
            reason: reason.into(),
        }
    }

    pub fn timed_out(asset_id: &AssetId, timeout: Duration, last_status: Option<String>) -> Self {
        Self::WaitTimedOut {
            asset_id: asset_id.clone(),
            timeout,
            last_status,
        }
    }

    pub fn provisioning(asset_id: &AssetId, message: impl Into<String>) -> Self {
        Self::Provisioning {
            asset_id: asset_id.clone(),
            message: message.into(),
        }
    }

    /// Check if waiting again (or polling) may still succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::WaitTimedOut { .. })
    }

    /// Check if this is an upstream processing failure.
    pub fn is_processing_failure(&self) -> bool {
        matches!(self, TrackerError::AssetProcessingFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_message() {
        let err = TrackerError::timed_out(&AssetId::from("job-42"), Duration::from_millis(50), None);
        assert_eq!(
            err.to_string(),
            "Timed out after 50ms waiting for Mux asset job-42 to become ready"
        );

        let err = TrackerError::timed_out(
            &AssetId::from("job-42"),
            Duration::from_secs(2),
            Some("preparing".to_string()),
        );
        assert!(err.to_string().ends_with("(last status: preparing)"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_processing_failed_carries_reason() {
        let err = TrackerError::processing_failed(&AssetId::from("a1"), "bad codec");
        assert!(err.to_string().contains("bad codec"));
        assert!(err.is_processing_failure());
        assert!(!err.is_retryable());
    }
}
