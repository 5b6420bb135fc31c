//! Bounded retry with exponential backoff for chain calls.

use crate::config::RetryPolicy;
use crate::domain::{ChainError, SwapError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run `op` under `timeout`, mapping expiry to `SwapError::Timeout`.
pub async fn with_timeout<T, F>(stage: &'static str, timeout: Duration, fut: F) -> Result<T, SwapError>
where
    F: Future<Output = Result<T, SwapError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| SwapError::Timeout { stage })?
}

/// Call `op` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts.
///
/// Only `Timing` and `Transient` failures are retried. Exhausting the policy
/// on one of those yields `SwapError::RetryLater`; other failures surface
/// immediately as `SwapError::Chain`.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, stage: &'static str, mut op: F) -> Result<T, SwapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.class().is_retryable() => return Err(SwapError::chain(stage, e)),
            Err(e) if attempt >= max_attempts => {
                warn!(stage, attempts = attempt, error = %e, "[xswap] Retries exhausted");
                return Err(SwapError::RetryLater {
                    stage,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    stage,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "[xswap] Retrying chain call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EscrowError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            max_attempts,
            multiplier: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = retry(&policy(5), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ChainError::Transport("down".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_errors_fail_fast() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = retry(&policy(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ChainError::Reverted(EscrowError::AlreadyCompleted))
        })
        .await;
        assert!(matches!(result, Err(SwapError::Chain { stage: "test", .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_becomes_retry_later() {
        let result: Result<(), _> = retry(&policy(3), "reveal", || async {
            Err(ChainError::Reverted(EscrowError::RevealTooEarly {
                allowed_at: 10,
                now: 5,
            }))
        })
        .await;
        assert!(matches!(result, Err(SwapError::RetryLater { stage: "reveal", .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let result: Result<(), _> = with_timeout("finality", Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SwapError::Timeout { stage: "finality" })));
    }
}
