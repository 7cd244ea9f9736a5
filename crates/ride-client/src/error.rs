//! Error types for the ride API client.
//!
//! Failures are sorted by what the caller should do next. A rejected
//! transition or a refused actor is definitive: refresh and re-render.
//! A [`RideClientError::Transient`] failure leaves the outcome unknown,
//! which is the only case worth retrying or reconciling.

use ride_state::{IntegrityError, RideError, RideOperation, RideStatus};
use serde::Deserialize;

use crate::config::ConfigError;

/// Errors from ride API operations.
#[derive(Debug, thiserror::Error)]
pub enum RideClientError {
    /// The ride was not in a state the operation can fire from.
    #[error("invalid transition: ride is {current}, cannot move to {attempted}: {message}")]
    InvalidTransition {
        current: RideStatus,
        attempted: RideStatus,
        message: String,
    },

    /// The caller is unauthenticated (401) or not permitted (403).
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The ride does not exist or is not visible to the caller.
    #[error("not found: {endpoint}")]
    NotFound { endpoint: String },

    /// Timeout, connection failure or server error. The operation may or
    /// may not have taken effect.
    #[error("transient failure on {endpoint}: {reason}")]
    Transient { endpoint: String, reason: String },

    /// Any other non-success response.
    #[error("ride API error on {endpoint} ({status}): {message}")]
    Api {
        endpoint: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The operation has no `PATCH` endpoint (creation).
    #[error("{0} is not a transition on an existing ride")]
    NotATransition(RideOperation),

    /// A ride record from the server violates a lifecycle invariant.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RideClientError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// The ride's actual status, when the server reported it.
    pub fn current_status(&self) -> Option<RideStatus> {
        match self {
            Self::InvalidTransition { current, .. } => Some(*current),
            _ => None,
        }
    }

    /// Classify a transport error.
    pub(crate) fn transport(endpoint: &str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            format!("timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Transient {
            endpoint: endpoint.to_string(),
            reason,
        }
    }

    /// Classify a non-success response from its status and body.
    pub(crate) fn from_response(endpoint: &str, status: u16, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
        let (code, message) = match &envelope {
            Some(env) => (Some(env.error.code.clone()), env.error.message.clone()),
            None => (None, body.to_string()),
        };

        if status == 409 && code.as_deref() == Some("INVALID_TRANSITION") {
            let details = envelope
                .as_ref()
                .and_then(|env| env.error.details.clone())
                .and_then(|d| serde_json::from_value::<TransitionDetails>(d).ok());
            if let Some(details) = details {
                return Self::InvalidTransition {
                    current: details.current_status,
                    attempted: details.attempted_status,
                    message,
                };
            }
        }

        match status {
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound {
                endpoint: endpoint.to_string(),
            },
            500..=599 => Self::Transient {
                endpoint: endpoint.to_string(),
                reason: format!("server error {status}: {message}"),
            },
            _ => Self::Api {
                endpoint: endpoint.to_string(),
                status,
                code,
                message,
            },
        }
    }
}

/// A locally rejected transition maps onto the error the server would give.
impl From<RideError> for RideClientError {
    fn from(err: RideError) -> Self {
        let message = err.to_string();
        match err {
            RideError::InvalidTransition {
                current, target, ..
            } => Self::InvalidTransition {
                current,
                attempted: target,
                message,
            },
            RideError::Unauthorized { .. } => Self::Unauthorized {
                status: 403,
                message,
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Deserialize)]
struct ErrorPayload {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct TransitionDetails {
    current_status: RideStatus,
    attempted_status: RideStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::{Actor, DriverId, RideId};
    use serde_json::json;

    #[test]
    fn invalid_transition_parsed_from_details() {
        let body = json!({
            "error": {
                "code": "INVALID_TRANSITION",
                "message": "cannot accept",
                "details": {
                    "current_status": "ACCEPTED",
                    "attempted_status": "ACCEPTED",
                    "operation": "accept"
                }
            }
        });
        let err = RideClientError::from_response("PATCH /v1/rides/x/accept", 409, &body.to_string());
        assert!(matches!(
            err,
            RideClientError::InvalidTransition {
                current: RideStatus::Accepted,
                attempted: RideStatus::Accepted,
                ..
            }
        ));
        assert_eq!(err.current_status(), Some(RideStatus::Accepted));
        assert!(!err.is_retryable());
    }

    #[test]
    fn plain_conflict_is_api_error() {
        let body = json!({"error": {"code": "CONFLICT", "message": "rider already has an active ride"}});
        let err = RideClientError::from_response("POST /v1/rides", 409, &body.to_string());
        match err {
            RideClientError::Api { status, code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("CONFLICT"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            RideClientError::from_response("e", 401, ""),
            RideClientError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            RideClientError::from_response("e", 403, "{}"),
            RideClientError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            RideClientError::from_response("e", 404, ""),
            RideClientError::NotFound { .. }
        ));
        let unavailable = RideClientError::from_response("e", 503, "down");
        assert!(unavailable.is_retryable());
    }

    #[test]
    fn local_rejection_matches_server_shape() {
        let ride_id = RideId::new();
        let err: RideClientError = RideError::InvalidTransition {
            ride_id,
            current: RideStatus::Cancelled,
            operation: RideOperation::Accept,
            target: RideStatus::Accepted,
        }
        .into();
        assert_eq!(err.current_status(), Some(RideStatus::Cancelled));

        let err: RideClientError = RideError::Unauthorized {
            ride_id: Some(ride_id),
            actor: Actor::Driver(DriverId::new()),
            operation: RideOperation::Pickup,
            reason: "not the bound driver".into(),
        }
        .into();
        assert!(matches!(err, RideClientError::Unauthorized { status: 403, .. }));
    }
}
