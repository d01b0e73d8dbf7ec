//! Retry with exponential back-off and jitter.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries only
//! errors for which [`ClientError::is_retriable`] holds. API-level rejections
//! and malformed bodies are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based), before jitter.
fn base_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10))
        .min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Retry | Sleep before it               |
/// |-------|-------------------------------|
/// | 1     | 1 000 ms × 2⁰ ± 25 % jitter   |
/// | 2     | 1 000 ms × 2¹ ± 25 % jitter   |
/// | 3     | 1 000 ms × 2² ± 25 % jitter   |
///
/// Delay is capped at 60 s.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = base_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient HTTP error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn api_err(status: Option<u16>) -> ClientError {
        ClientError::Api {
            service: "test",
            status,
            message: "boom".to_owned(),
        }
    }

    #[test]
    fn retriable_statuses() {
        assert!(api_err(Some(500)).is_retriable());
        assert!(api_err(Some(503)).is_retriable());
        assert!(api_err(Some(429)).is_retriable());
        assert!(api_err(Some(529)).is_retriable());
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!api_err(Some(400)).is_retriable());
        assert!(!api_err(Some(401)).is_retriable());
        assert!(!api_err(None).is_retriable());
        assert!(!ClientError::InvalidVerdict("nope".to_owned()).is_retriable());
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let source = serde_json::from_str::<()>("invalid").unwrap_err();
        let err = ClientError::Deserialize {
            context: "test".to_owned(),
            source,
        };
        assert!(!err.is_retriable());
    }

    #[test]
    fn delay_doubles_and_caps() {
        assert_eq!(base_delay_ms(1_000, 1), 1_000);
        assert_eq!(base_delay_ms(1_000, 2), 2_000);
        assert_eq!(base_delay_ms(1_000, 3), 4_000);
        assert_eq!(base_delay_ms(1_000, 30), MAX_DELAY_MS);
        assert_eq!(base_delay_ms(u64::MAX, 5), MAX_DELAY_MS);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ClientError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(api_err(Some(529)))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_err(Some(503)))
            }
        })
        .await;
        assert!(matches!(result, Err(ClientError::Api { status: Some(503), .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_err(Some(401)))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "401 must not be retried");
        assert!(result.is_err());
    }
}
