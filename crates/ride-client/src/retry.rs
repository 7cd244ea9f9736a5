//! Retry with exponential backoff for idempotent ride API reads.
//!
//! Only [`RideClientError::Transient`] failures are retried. Transitions
//! are never routed through here: their outcome after a transient failure
//! is settled by reconciliation, not by blind resubmission.

use std::future::Future;
use std::time::Duration;

use crate::error::RideClientError;

/// Maximum number of retry attempts after the initial request.
pub(crate) const MAX_RETRIES: u32 = 3;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
pub(crate) const BASE_DELAY_MS: u64 = 200;

/// Run `f` until it succeeds, fails non-transiently, or retries run out.
pub(crate) async fn retry_read<T, F, Fut>(endpoint: &str, f: F) -> Result<T, RideClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RideClientError>>,
{
    for attempt in 0..MAX_RETRIES {
        match f().await {
            Err(e) if e.is_retryable() => {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "ride API read failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transient() -> RideClientError {
        RideClientError::Transient {
            endpoint: "GET /v1/rides".into(),
            reason: "connection failed".into(),
        }
    }

    #[tokio::test]
    async fn retry_exhausts_all_attempts_on_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result: Result<(), _> = retry_read("GET /v1/rides", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn definitive_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result: Result<(), _> = retry_read("GET /v1/rides/x", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(RideClientError::NotFound {
                    endpoint: "GET /v1/rides/x".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(RideClientError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result = retry_read("GET /v1/rides", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(transient())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
