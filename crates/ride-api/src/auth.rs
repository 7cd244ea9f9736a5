//! # Authentication Middleware
//!
//! Bearer tokens encode the caller's role and identity:
//!
//! ```text
//! Bearer {role}:{user_id}:{secret}     role ∈ rider | driver | admin
//! ```
//!
//! The secret is compared in constant time against the configured token.
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions, from which handlers take the [`Actor`] that the
//! lifecycle state machine authorizes against.
//!
//! When no token is configured, secrets are not checked: a well-formed
//! `{role}:{user_id}:{anything}` header is trusted as-is, and requests
//! without one act as an administrator.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ride_core::{Actor, AdminId, Role};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub actor: Actor,
}

impl CallerIdentity {
    /// Identity used when authentication is disabled and no token is sent.
    pub fn development_admin() -> Self {
        Self {
            actor: Actor::Admin(AdminId::from_uuid(Uuid::nil())),
        }
    }

    pub fn role(&self) -> Role {
        self.actor.role()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of secrets. Unequal lengths still perform a
/// comparison so timing does not reveal the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{role}:{user_id}:{secret}`.
///
/// With `expected_secret = None` the secret part is not checked.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    let [role_str, user_str, secret] = parts.as_slice() else {
        return Err("invalid token format, expected {role}:{user_id}:{secret}".into());
    };

    if let Some(expected) = expected_secret {
        if !constant_time_token_eq(secret, expected) {
            return Err("invalid bearer token".into());
        }
    }

    let role: Role = role_str
        .parse()
        .map_err(|_| format!("unknown role: {role_str}"))?;
    let user_id: Uuid = user_str
        .parse()
        .map_err(|e| format!("invalid user_id: {e}"))?;

    Ok(CallerIdentity {
        actor: Actor::from_parts(role, user_id),
    })
}

/// Validate the `Authorization` header and inject a [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let identity = match (config.token.as_deref(), auth_header) {
        (expected, Some(value)) if value.starts_with("Bearer ") => {
            match parse_bearer_token(&value[7..], expected.map(String::as_str)) {
                Ok(identity) => identity,
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    return unauthorized_response(&msg);
                }
            }
        }
        (Some(_), Some(_)) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            return unauthorized_response("authorization header must use Bearer scheme");
        }
        (Some(_), None) => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
        (None, _) => CallerIdentity::development_admin(),
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
