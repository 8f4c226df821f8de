//! Asset status snapshots returned by status queries.

use serde::{Deserialize, Serialize};

use crate::{AssetId, PlaybackId};

/// Point-in-time view of an asset, as reported by the status collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: AssetId,
    /// Raw platform status string (`preparing`, `ready`, `errored`, ...).
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<PlaybackId>,
    /// Diagnostic messages reported for failed assets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Classification of a status string into the terminal-state vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetPhase {
    Ready,
    Errored,
    /// Anything that is neither ready nor errored.
    Pending,
}

impl AssetPhase {
    pub fn from_status(status: &str) -> Self {
        match status {
            "ready" => AssetPhase::Ready,
            "errored" => AssetPhase::Errored,
            _ => AssetPhase::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetPhase::Ready => "ready",
            AssetPhase::Errored => "errored",
            AssetPhase::Pending => "pending",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssetPhase::Pending)
    }
}

impl AssetSnapshot {
    pub fn new(id: impl Into<AssetId>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            playback_id: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_playback_id(mut self, playback_id: impl Into<PlaybackId>) -> Self {
        self.playback_id = Some(playback_id.into());
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<String>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn phase(&self) -> AssetPhase {
        AssetPhase::from_status(&self.status)
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == AssetPhase::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_classification() {
        assert_eq!(AssetPhase::from_status("ready"), AssetPhase::Ready);
        assert_eq!(AssetPhase::from_status("errored"), AssetPhase::Errored);
        assert_eq!(AssetPhase::from_status("preparing"), AssetPhase::Pending);
        assert_eq!(AssetPhase::from_status(""), AssetPhase::Pending);
        // Matching is exact
        assert_eq!(AssetPhase::from_status("READY"), AssetPhase::Pending);
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = AssetSnapshot::new("a1", "ready").with_playback_id("pb_x");
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.playback_id, Some(PlaybackId::from("pb_x")));
        assert!(snapshot.phase().is_terminal());
    }
}
