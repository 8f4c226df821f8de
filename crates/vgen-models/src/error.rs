//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// An event that cannot be addressed to any waiter (no asset id).
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn malformed_event(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }
}
