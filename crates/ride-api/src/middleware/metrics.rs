//! # Request Metrics
//!
//! In-process atomic counters: total requests, error responses, and 409
//! responses (rejected transitions and active-ride conflicts) separately,
//! since those are the signal of clients racing on the same ride.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub conflict_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn conflicts(&self) -> u64 {
        self.conflict_count.load(Ordering::Relaxed)
    }
}

/// Middleware that increments the counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.request_count.fetch_add(1, Ordering::Relaxed);
        let status = response.status();
        if status.is_server_error() || status.is_client_error() {
            m.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if status == StatusCode::CONFLICT {
            m.conflict_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn counts_requests_errors_and_conflicts() {
        let metrics = ApiMetrics::new();
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/conflict", get(|| async { StatusCode::CONFLICT }))
            .layer(from_fn(metrics_middleware))
            .layer(axum::Extension(metrics.clone()));

        for uri in ["/ok", "/conflict", "/missing"] {
            let request = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
            app.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(metrics.requests(), 3);
        assert_eq!(metrics.errors(), 2);
        assert_eq!(metrics.conflicts(), 1);
    }
}
