//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vgen_models::ModelError;
use vgen_mux::MuxError;
use vgen_tracker::TrackerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("Mux error: {0}")]
    Mux(#[from] MuxError),

    #[error("Invalid webhook payload: {0}")]
    Model(#[from] ModelError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Model(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Tracker(e) => match e {
                TrackerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                TrackerError::AlreadyWaiting(_) => StatusCode::CONFLICT,
                TrackerError::AssetProcessingFailed { .. } => StatusCode::BAD_GATEWAY,
                TrackerError::WaitTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                TrackerError::Provisioning { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Mux(e) => match e {
                MuxError::NotFound(_) => StatusCode::NOT_FOUND,
                MuxError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable code for errors a client can act on.
    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Tracker(TrackerError::AlreadyWaiting(_)) => Some("already_waiting"),
            ApiError::Tracker(TrackerError::AssetProcessingFailed { .. }) => Some("asset_errored"),
            ApiError::Tracker(TrackerError::WaitTimedOut { .. }) => Some("wait_timed_out"),
            ApiError::Mux(MuxError::InvalidSignature(_)) => Some("invalid_signature"),
            ApiError::Model(_) => Some("malformed_event"),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
