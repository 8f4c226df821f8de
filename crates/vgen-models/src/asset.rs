//! Asset and playback identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Base URL of the Mux HLS stream host.
const STREAM_BASE_URL: &str = "https://stream.mux.com";

/// Identifier of one asynchronous ingest job (a Mux asset id).
///
/// Ids are opaque and must be unique per job. Surrounding whitespace is
/// stripped on construction so that the same id always keys the same entry.
/// An empty id is representable so that callers can be told about it; the
/// tracker rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        match s.trim() {
            trimmed if trimmed.len() == s.len() => Self(s),
            trimmed => Self(trimmed.to_string()),
        }
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_string)
    }
}

/// Playback reference issued by the streaming platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackId(pub String);

impl PlaybackId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// HLS stream URL for this playback id.
    pub fn stream_url(&self) -> String {
        format!("{}/{}.m3u8", STREAM_BASE_URL, self.0)
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlaybackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PlaybackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
