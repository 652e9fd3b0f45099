//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use outinghub_core::error::{AppError, ErrorKind};

/// Seconds a client should wait before retrying a `Busy` response.
const RETRY_AFTER_SECONDS: &str = "1";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the same call may succeed if retried.
    pub retryable: bool,
}

/// Handler error: an [`AppError`] rendered as JSON.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict
        | ErrorKind::InvalidState
        | ErrorKind::CapacityExceeded
        | ErrorKind::Closed => StatusCode::CONFLICT,
        ErrorKind::Busy | ErrorKind::StorageFailure => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Integrity
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        // Storage and internal details never reach the caller.
        let message = match err.kind {
            ErrorKind::StorageFailure => {
                tracing::warn!(error = %err, "Storage failure");
                "The service is temporarily unavailable, please retry".to_string()
            }
            ErrorKind::Integrity => {
                tracing::error!(error = %err, "Integrity error");
                "An internal error occurred".to_string()
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %err, "Internal server error");
                "An internal error occurred".to_string()
            }
            _ => err.message.clone(),
        };

        let body = ApiErrorResponse {
            success: false,
            error: err.kind.code().to_string(),
            message,
            retryable: err.is_retryable(),
        };

        let mut response = (status, Json(body)).into_response();
        if err.kind == ErrorKind::Busy {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECONDS));
        }
        response
    }
}
