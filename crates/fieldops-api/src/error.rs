//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps dispatch-engine errors to HTTP status codes and JSON error
//! bodies with a machine-readable code and message. Internal error
//! details are never exposed in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use fieldops_dispatch::DispatchError;

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for
/// Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or malformed input, including an action outside
    /// `{accept, reject}` (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A transition was attempted on a terminal request (409).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The response targets an assignment a concurrent reassignment
    /// already superseded (409).
    #[error("stale response: {0}")]
    StaleResponse(String),

    /// Internal server error (500). Message is logged but not returned
    /// to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for
    /// this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            Self::StaleResponse(_) => (StatusCode::CONFLICT, "STALE_RESPONSE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert dispatch-engine errors to API errors.
///
/// Exhaustion never reaches this conversion — it is a successful
/// outcome, not an error. The 400 mapping for validation failures is
/// part of the external contract for request intake.
impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match &err {
            DispatchError::Validation(_) | DispatchError::InvalidAction(_) => {
                Self::BadRequest(err.to_string())
            }
            DispatchError::NotFound(_) => Self::NotFound(err.to_string()),
            DispatchError::InvalidState { .. } => Self::InvalidState(err.to_string()),
            DispatchError::StaleResponse { .. } => Self::StaleResponse(err.to_string()),
        }
    }
}

impl From<fieldops_core::ValidationError> for AppError {
    fn from(err: fieldops_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_core::RequestId;

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing request".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn bad_request_status_code() {
        let err = AppError::BadRequest("user_id is missing".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "BAD_REQUEST");
    }

    #[test]
    fn terminal_and_stale_conflicts() {
        let (status, code) = AppError::InvalidState("done".to_string()).status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "INVALID_STATE");

        let (status, code) = AppError::StaleResponse("moved on".to_string()).status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "STALE_RESPONSE");
    }

    #[test]
    fn dispatch_errors_map_per_contract() {
        let err: AppError = DispatchError::NotFound(RequestId::new()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = DispatchError::InvalidAction("maybe".to_string()).into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
