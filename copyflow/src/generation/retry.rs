//! Retry with fixed exponential backoff.
//!
//! Only failures the caller classifies as transient are retried. The delay
//! before attempt `k` (k >= 2) is `base * 2^(k-2)`, capped at `max_delay_ms`.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts, including the initial one.
    pub max_attempts: usize,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Effective attempt budget; never less than one.
    #[must_use]
    pub fn attempt_budget(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Returns the delay to wait after `failed_attempts` consecutive failures.
    #[must_use]
    pub fn backoff_delay(&self, failed_attempts: usize) -> Duration {
        let exponent = u32::try_from(failed_attempts.saturating_sub(1)).unwrap_or(u32::MAX);
        let delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent))
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Attempt tracking for one retried operation.
#[derive(Debug, Default)]
pub struct RetryState {
    /// Attempts made so far.
    pub attempt: usize,
}

impl RetryState {
    /// Creates a new retry state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the attempt budget is spent.
    #[must_use]
    pub fn is_exhausted(&self, config: &RetryConfig) -> bool {
        self.attempt >= config.attempt_budget()
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more retries, give up.
    GiveUp,
    /// Don't retry, the error is not retryable.
    NotRetryable,
}

/// Decides what to do after a failed attempt.
#[must_use]
pub fn should_retry(state: &RetryState, config: &RetryConfig, retryable: bool) -> RetryDecision {
    if !retryable {
        return RetryDecision::NotRetryable;
    }
    if state.is_exhausted(config) {
        return RetryDecision::GiveUp;
    }
    RetryDecision::Retry(config.backoff_delay(state.attempt))
}

/// Why a retried operation ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted {
        /// Attempts made.
        attempts: usize,
        /// The final error.
        last: E,
    },
    /// A non-retryable error ended the operation immediately.
    Permanent(E),
}

/// Executes an operation, retrying failures that `is_retryable` accepts.
pub async fn with_retry<T, E, F, Fut, P>(
    config: &RetryConfig,
    key: &str,
    is_retryable: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut state = RetryState::new();

    loop {
        state.attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match should_retry(&state, config, is_retryable(&e)) {
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        key,
                        attempt = state.attempt,
                        max_attempts = config.attempt_budget(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(key, attempts = state.attempt, error = %e, "Retries exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: state.attempt,
                        last: e,
                    });
                }
                RetryDecision::NotRetryable => return Err(RetryError::Permanent(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig::new().with_base_delay_ms(1).with_max_attempts(4)
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay_ms, 2000);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RetryConfig::new().with_base_delay_ms(100).with_max_delay_ms(10_000);

        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let config = RetryConfig::new().with_base_delay_ms(1000).with_max_delay_ms(5000);
        assert_eq!(config.backoff_delay(10), Duration::from_millis(5000));
        assert_eq!(config.backoff_delay(usize::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn test_should_retry_decisions() {
        let config = RetryConfig::new().with_max_attempts(2).with_base_delay_ms(10);
        let mut state = RetryState::new();
        state.attempt = 1;

        assert_eq!(
            should_retry(&state, &config, true),
            RetryDecision::Retry(Duration::from_millis(10))
        );
        assert_eq!(should_retry(&state, &config, false), RetryDecision::NotRetryable);

        state.attempt = 2;
        assert_eq!(should_retry(&state, &config, true), RetryDecision::GiveUp);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let config = RetryConfig::new().with_max_attempts(0);
        assert_eq!(config.attempt_budget(), 1);
    }

    #[tokio::test]
    async fn test_with_retry_success_first_try() {
        let mut calls = 0;
        let result: Result<i32, RetryError<String>> =
            with_retry(&fast(), "test", |_| true, || {
                calls += 1;
                async { Ok(42) }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_with_retry_success_on_last_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<&str, RetryError<String>> =
            with_retry(&fast(), "test", |_| true, || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        Err(format!("attempt {n}"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_with_retry_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), RetryError<String>> =
            with_retry(&fast(), "test", |_| true, || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("overloaded".to_string()) }
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 4,
                last: "overloaded".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_sleeps_doubling_delays_up_to_cap() {
        let config = RetryConfig::new()
            .with_max_attempts(5)
            .with_base_delay_ms(20)
            .with_max_delay_ms(100);
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let recorder = calls.clone();

        let result: Result<(), RetryError<String>> =
            with_retry(&config, "test", |_| true, || {
                recorder.lock().push(tokio::time::Instant::now());
                async { Err("overloaded".to_string()) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 5, .. })));
        let calls = calls.lock();
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(20),
                Duration::from_millis(40),
                Duration::from_millis(80),
                Duration::from_millis(100),
            ]
        );
    }

    #[tokio::test]
    async fn test_with_retry_permanent_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), RetryError<String>> =
            with_retry(&fast(), "test", |_| false, || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_string()) }
            })
            .await;

        assert_eq!(result, Err(RetryError::Permanent("bad request".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
