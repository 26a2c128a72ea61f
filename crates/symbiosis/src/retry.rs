//! Bounded retry with linear backoff.
//!
//! The delay before attempt `n + 1` is `n × unit_delay`, so the default
//! policy waits 1 s, then 2 s. There is no delay after the final attempt
//! and every error is treated as retryable.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub unit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            unit_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, unit_delay: Duration) -> Self {
        Self {
            max_attempts,
            unit_delay,
        }
    }

    /// Attempts actually made; zero is treated as one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff after the given 1-based failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.unit_delay.saturating_mul(attempt)
    }
}

/// Every attempt failed. Carries the error from the last one.
#[derive(Debug, Error)]
#[error("Gave up after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    #[source]
    pub last: E,
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                return Err(RetryExhausted { attempts, last: e });
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt,
                    attempts,
                    e,
                    delay
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
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn counting_op(
        calls: Arc<AtomicU32>,
        fail_first: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= fail_first {
                std::future::ready(Err(format!("failure {n}")))
            } else {
                std::future::ready(Ok(n))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_try_without_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let result = call_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), 0)).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_failures_with_linear_delays() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let result = call_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), 2)).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let err = call_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), u32::MAX))
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // No sleep after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let err = call_with_retry(&policy, counting_op(calls.clone(), u32::MAX))
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_after_is_linear() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(4), Duration::from_secs(1));
    }
}
