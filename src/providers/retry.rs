//! Retry policy and delay calculation.
//!
//! Provides [`RetryPolicy`] for controlling retry behaviour and the shared
//! [`with_retry()`] helper that runs any fallible async operation under a
//! policy. Which failures are worth retrying is decided by the caller.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with a ceiling:
///
/// ```rust
/// # use docquery::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(200))
///     .multiplier(3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Delay before the first retry. Default: 2s.
    pub base_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 60s.
    pub max_delay: Duration,
    /// Growth factor applied per retry. Default: 2.0.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with the default schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff growth factor.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Calculate the delay after a failed attempt (1-indexed).
    ///
    /// `base_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    /// Values that cannot be represented (overflow, NaN) also yield `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// The full backoff schedule: the sleep inserted before each retry.
    ///
    /// Has `max_attempts - 1` entries.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }
}

/// Execute an async operation with retry logic.
///
/// Calls `f` until it succeeds, fails with an error `is_retryable` rejects,
/// or `policy.max_attempts` calls have been made. Sleeps between attempts
/// according to the policy; no sleep follows the final attempt. The error of
/// the last attempt is returned unchanged.
///
/// `max_attempts` of 0 is treated as 1.
pub async fn with_retry<F, Fut, T, E, R>(
    policy: &RetryPolicy,
    provider_name: &str,
    is_retryable: R,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = policy.delay_for_attempt(attempt);
                metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider_name.to_owned())
                    .increment(1);
                warn!(
                    provider = provider_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn delay_grows_geometrically() {
        let policy = RetryPolicy::new()
            .base_delay(Duration::from_millis(100))
            .multiplier(3.0)
            .max_delay(Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(300));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(900));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::new()
            .base_delay(Duration::from_secs(2))
            .max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn degenerate_multiplier_falls_back_to_cap() {
        let policy = RetryPolicy::new()
            .multiplier(f64::NAN)
            .max_delay(Duration::from_secs(7));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(7));
    }

    #[test]
    fn schedule_has_one_entry_per_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert!(RetryPolicy::disabled().schedule().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_calls_once() {
        let mut calls = 0;
        let result: Result<(), &str> = with_retry(
            &RetryPolicy::new().max_attempts(0),
            "test",
            |_| true,
            || {
                calls += 1;
                std::future::ready(Err("nope"))
            },
        )
        .await;
        assert_eq!(result, Err("nope"));
        assert_eq!(calls, 1);
    }
}
