//! # ride-api — Ride Lifecycle Service
//!
//! The system of record for rides. Every state change goes through the
//! ride-state machine under the store's write lock; the service adds
//! authentication, fare quoting, role-scoped reads and the active-ride
//! guard on top.
//!
//! ## API Surface
//!
//! | Method  | Path                          | Operation            |
//! |---------|-------------------------------|----------------------|
//! | `POST`  | `/v1/rides`                   | request a ride       |
//! | `GET`   | `/v1/rides`                   | list visible rides   |
//! | `GET`   | `/v1/rides/:id`               | ride details         |
//! | `GET`   | `/v1/rides/:id/actions`       | caller's view        |
//! | `PATCH` | `/v1/rides/:id/accept`        | accept               |
//! | `PATCH` | `/v1/rides/:id/cancel`        | cancel               |
//! | `PATCH` | `/v1/rides/:id/pickup`        | pickup               |
//! | `PATCH` | `/v1/rides/:id/transit`       | start transit        |
//! | `PATCH` | `/v1/rides/:id/complete`      | complete             |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod pricing;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the application router with a fresh metrics registry.
pub fn app(state: AppState) -> Router {
    app_with_metrics(state, ApiMetrics::new())
}

/// Assemble the application router, recording into `metrics`.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware so
/// they remain accessible without credentials.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::rides::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the router is serving.
async fn readiness() -> &'static str {
    "ready"
}
