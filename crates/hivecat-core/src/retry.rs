//! Retry-with-backoff executor driven by a predicate over the error type.
//!
//! A [`RetryPolicy`] bounds three things at once: the number of attempts, the
//! per-retry delay (exponential, capped), and the total wall-clock budget. The
//! caller decides which failures are worth another attempt by passing a
//! predicate; every other failure is returned on first occurrence.
//!
//! # Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use hivecat_core::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::immediate(3);
//! let result: Result<u32, &str> = policy
//!     .run("example", |attempt| async move {
//!         if attempt < 3 { Err("transient") } else { Ok(attempt) }
//!     }, |err| *err == "transient")
//!     .await;
//! assert_eq!(result, Ok(3));
//! # });
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1);

/// Default per-retry delay cap.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(5_000);

/// Default multiplicative growth between consecutive delays.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 4.0;

/// Default total wall-clock budget across all attempts.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(30);

/// Bounded exponential backoff policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Growth factor applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Total budget, in milliseconds. No retry is scheduled past it.
    pub max_duration_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: duration_ms(DEFAULT_INITIAL_BACKOFF),
            max_backoff_ms: duration_ms(DEFAULT_MAX_BACKOFF),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_duration_ms: duration_ms(DEFAULT_MAX_DURATION),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and no delay between them.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_factor: 1.0,
            ..Self::default()
        }
    }

    /// Total wall-clock budget.
    #[must_use]
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    /// Validates the policy bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a zero attempt count, a growth factor
    /// below 1, or an initial delay above the cap.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidInput(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Error::InvalidInput(format!(
                "retry backoff_factor must be >= 1 (got {})",
                self.backoff_factor
            )));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(Error::InvalidInput(format!(
                "retry initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Delay to wait after the `retry`-th failure (1-based).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let millis = self.initial_backoff_ms as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Runs `attempt` until it succeeds, fails with an error `should_retry`
    /// rejects, or the attempt/time budget is spent.
    ///
    /// `attempt` receives the 1-based attempt number. On exhaustion the error
    /// of the last attempt is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable one once
    /// the budget is exhausted.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        operation: &str,
        mut attempt: F,
        should_retry: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let max_attempts = self.max_attempts.max(1);
        let mut number = 1;

        loop {
            let err = match attempt(number).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) {
                return Err(err);
            }
            if number >= max_attempts {
                tracing::debug!(operation, attempts = number, error = %err, "retry attempts exhausted");
                return Err(err);
            }

            let delay = self.backoff_for(number);
            if started.elapsed() + delay > self.max_duration() {
                tracing::debug!(operation, attempts = number, error = %err, "retry time budget exhausted");
                return Err(err);
            }

            tracing::debug!(
                operation,
                attempt = number,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "retrying after retryable failure"
            );
            tokio::time::sleep(delay).await;
            number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum Failure {
        Transient(u32),
        Fatal,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn is_transient(err: &Failure) -> bool {
        matches!(err, Failure::Transient(_))
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=9)
            .map(|n| duration_ms(policy.backoff_for(n)))
            .collect();
        assert_eq!(delays, vec![1, 4, 16, 64, 256, 1024, 4096, 5000, 5000]);
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy { max_attempts: 0, ..RetryPolicy::default() }.validate().is_err());
        assert!(RetryPolicy { backoff_factor: 0.5, ..RetryPolicy::default() }.validate().is_err());
        assert!(
            RetryPolicy { initial_backoff_ms: 10, max_backoff_ms: 1, ..RetryPolicy::default() }
                .validate()
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_last_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = RetryPolicy::default()
            .run(
                "test",
                |attempt| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        if attempt < 10 { Err(Failure::Transient(attempt)) } else { Ok(attempt) }
                    }
                },
                is_transient,
            )
            .await;

        assert_eq!(result, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: std::result::Result<(), Failure> = RetryPolicy::default()
            .run(
                "test",
                |attempt| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(Failure::Transient(attempt))
                    }
                },
                is_transient,
            )
            .await;

        assert_eq!(result, Err(Failure::Transient(10)));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_aborts_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: std::result::Result<(), Failure> = RetryPolicy::default()
            .run(
                "test",
                |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(Failure::Fatal)
                    }
                },
                is_transient,
            )
            .await;

        assert_eq!(result, Err(Failure::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_budget_stops_retries() {
        let policy = RetryPolicy {
            max_attempts: 100,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 1_000,
            backoff_factor: 1.0,
            max_duration_ms: 3_500,
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: std::result::Result<(), Failure> = policy
            .run(
                "test",
                |attempt| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(Failure::Transient(attempt))
                    }
                },
                is_transient,
            )
            .await;

        // Delays at 1s, 2s, 3s fit the budget; a fourth would end at 4s.
        assert_eq!(result, Err(Failure::Transient(4)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
