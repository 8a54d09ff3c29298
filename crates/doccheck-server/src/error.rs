//! HTTP error type for the serving layer.
//!
//! Maps core and security failures to status codes with a structured JSON
//! error body. Rate-limit rejections are an explicit 429, never an
//! exception escaping as a 500; internal error details are logged but not
//! returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use doccheck_core::CoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "RATE_LIMITED").
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown result id or missing resource (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or disallowed request content (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured size cap (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Client exceeded its request window (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Internal failure (500). Message logged, not exposed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownDocumentType(_) | CoreError::UnsupportedVersion(_) => {
                Self::BadRequest(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "internal server error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_client_codes() {
        let err: AppError = CoreError::UnknownDocumentType("memo".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = CoreError::UnsupportedVersion(9).into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rate_limited_is_429() {
        let (status, code) = AppError::RateLimited.status_and_code();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(code, "RATE_LIMITED");
    }
}
