//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps lifecycle errors from ride-state and validation errors from
//! ride-core to HTTP status codes with a JSON body carrying a
//! machine-readable code, a message and optional details.
//!
//! | Error                         | Status | Code                 |
//! |-------------------------------|--------|----------------------|
//! | `RideError::InvalidTransition`| 409    | `INVALID_TRANSITION` |
//! | `RideError::Unauthorized`     | 403    | `FORBIDDEN`          |
//! | unknown or invisible ride     | 404    | `NOT_FOUND`          |
//! | missing or bad credentials    | 401    | `UNAUTHORIZED`       |
//! | active-ride guard             | 409    | `CONFLICT`           |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ride_state::{RideError, RideOperation, RideStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_TRANSITION").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found, or not visible to the caller (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller may not perform this operation (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with other resources, e.g. a second active ride (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The ride is not in a state the operation can fire from (409).
    #[error("{message}")]
    InvalidTransition {
        message: String,
        current: RideStatus,
        attempted: RideStatus,
        operation: RideOperation,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidTransition {
                current,
                attempted,
                operation,
                ..
            } => Some(serde_json::json!({
                "current_status": current,
                "attempted_status": attempted,
                "operation": operation,
            })),
            _ => None,
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

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ride_core::ValidationError> for AppError {
    fn from(err: ride_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        match err {
            RideError::InvalidTransition {
                current,
                operation,
                target,
                ..
            } => Self::InvalidTransition {
                message: err.to_string(),
                current,
                attempted: target,
                operation,
            },
            RideError::Unauthorized { .. } => Self::Forbidden(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use ride_core::{Actor, DriverId, RideId};

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn invalid_transition_maps_to_409_with_details() {
        let err = AppError::from(RideError::InvalidTransition {
            ride_id: RideId::new(),
            current: RideStatus::Requested,
            operation: RideOperation::Pickup,
            target: RideStatus::PickedUp,
        });
        assert_eq!(
            err.status_and_code(),
            (StatusCode::CONFLICT, "INVALID_TRANSITION")
        );
        let details = err.details().unwrap();
        assert_eq!(details["current_status"], "REQUESTED");
        assert_eq!(details["attempted_status"], "PICKED_UP");
        assert_eq!(details["operation"], "pickup");
    }

    #[test]
    fn ride_unauthorized_maps_to_forbidden() {
        let err = AppError::from(RideError::Unauthorized {
            ride_id: Some(RideId::new()),
            actor: Actor::Driver(DriverId::new()),
            operation: RideOperation::Complete,
            reason: "not bound".into(),
        });
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn internal_error_message_is_hidden() {
        let response = AppError::Internal("lock poisoned at 0xdead".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "An internal error occurred");
        assert!(json["error"].get("details").is_none());
    }
}
