//! Mux client error types.

use thiserror::Error;

pub type MuxResult<T> = Result<T, MuxError>;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Mux API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MuxError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::InvalidSignature(msg.into())
    }

    /// Check if the request may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            MuxError::Network(_) => true,
            MuxError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let server_error = MuxError::Api {
            status: 503,
            body: String::new(),
        };
        let rate_limited = MuxError::Api {
            status: 429,
            body: String::new(),
        };
        let bad_request = MuxError::Api {
            status: 400,
            body: String::new(),
        };

        assert!(server_error.is_retryable());
        assert!(rate_limited.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!MuxError::NotFound("a1".to_string()).is_retryable());
    }
}
