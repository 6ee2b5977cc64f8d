//! Retry with exponential backoff for outbound calls.
//!
//! Shared by the exchange-rate client and the notification email path.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Creates a policy from config values expressed in milliseconds.
    #[must_use]
    pub const fn from_millis(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self::new(max_attempts, Duration::from_millis(base_delay_ms))
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `op` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number. The last error is
/// returned when every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_backoff_if(policy, operation, |_| true, op).await
}

/// Like [`retry_with_backoff`], but stops early when `should_retry` returns
/// false for an error (for example a 4xx response that will never succeed).
pub async fn retry_with_backoff_if<T, E, P, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && should_retry(&e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
