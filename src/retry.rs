// ABOUTME: Bounded retry loop with capped exponential backoff for Share operations
// ABOUTME: Used for login attempts and for polling until a new reading appears
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Backoff/Retry Controller
//!
//! [`with_retry`] runs an async operation until it succeeds, the retry budget
//! is exhausted, or the operation asks to abort. The delay before retry `n`
//! is `min_delay * factor^(n-1)`, capped at `max_delay`, optionally stretched
//! by a random jitter that never exceeds the cap.
//!
//! The controller never looks at the error itself. Operations signal that an
//! error is final by returning [`RetryError::Permanent`]; everything else is
//! retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::constants::timing;
use crate::errors::ShareError;

/// Bounds for a retry loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `retries + 1`
    pub retries: u32,
    /// Delay before the first retry
    pub min_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub factor: f64,
    /// Extra random stretch as a fraction of the delay (0.0 disables jitter)
    pub jitter: f64,
}

impl RetryPolicy {
    /// Create a policy with the default growth factor and no jitter
    #[must_use]
    pub const fn new(retries: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            retries,
            min_delay,
            max_delay,
            factor: timing::BACKOFF_FACTOR,
            jitter: 0.0,
        }
    }

    /// Enable jitter, clamped to `0.0..=1.0`
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay to sleep before retry number `retry` (1-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let min_ms = self.min_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let mut delay_ms = (min_ms * self.factor.powi(exponent)).min(max_ms);
        if self.jitter > 0.0 {
            let stretch = rand::thread_rng().gen_range(0.0..=self.jitter);
            delay_ms = (delay_ms * (1.0 + stretch)).min(max_ms);
        }
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            timing::POLL_RETRIES,
            Duration::from_millis(timing::MIN_BACKOFF_MS),
            Duration::from_millis(timing::MAX_BACKOFF_MS),
        )
    }
}

/// Outcome of one failed attempt
#[derive(Debug)]
pub enum RetryError<E> {
    /// Try again after the backoff delay
    Transient(E),
    /// Stop immediately and surface this error
    Permanent(E),
}

impl RetryError<ShareError> {
    /// Classify a `ShareError` by its own retryability
    #[must_use]
    pub fn classify(err: ShareError) -> Self {
        if err.is_retryable() {
            Self::Transient(err)
        } else {
            Self::Permanent(err)
        }
    }
}

/// Run `operation` until it succeeds, aborts, or the retry budget runs out
///
/// The closure receives the 1-based attempt number. On exhaustion the error
/// from the final attempt is returned.
///
/// # Errors
///
/// Returns the permanent error as soon as one is raised, or the last
/// transient error once `policy.retries` retries have failed.
pub async fn with_retry<T, E, F, Fut>(
    label: &'static str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let mut attempt: u32 = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = label, attempt, "succeeded after retrying");
                }
                return Ok(value);
            }
            Err(RetryError::Permanent(err)) => {
                debug!(operation = label, attempt, error = %err, "aborting without retry");
                return Err(err);
            }
            Err(RetryError::Transient(err)) => {
                if attempt > policy.retries {
                    warn!(
                        operation = label,
                        attempts = attempt,
                        error = %err,
                        "retry budget exhausted"
                    );
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                debug!(
                    operation = label,
                    attempt,
                    retries = policy.retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after backoff"
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

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_secs(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(20));
        assert_eq!(policy.delay_for(4), Duration::from_secs(40));
        assert_eq!(policy.delay_for(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for(900), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy =
            RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(3)).with_jitter(0.5);
        for retry in 1..20 {
            let delay = policy.delay_for(retry);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            RetryError::classify(ShareError::NoNewData),
            RetryError::Transient(ShareError::NoNewData)
        ));
        assert!(matches!(
            RetryError::classify(ShareError::auth_rejected("AccountLocked", "Locked.")),
            RetryError::Permanent(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10), Duration::from_millis(50));
        let mut calls = 0;
        let result: Result<u32, String> = with_retry("test", &policy, |attempt| {
            calls += 1;
            async move {
                if attempt < 3 {
                    Err(RetryError::Transient(format!("failure {attempt}")))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(50));
        let mut calls = 0;
        let result: Result<(), String> = with_retry("test", &policy, |attempt| {
            calls += 1;
            async move { Err(RetryError::Transient(format!("failure {attempt}"))) }
        })
        .await;

        assert_eq!(result, Err("failure 3".to_owned()));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_aborts() {
        let policy = RetryPolicy::new(10, Duration::from_millis(10), Duration::from_millis(50));
        let mut calls = 0;
        let result: Result<(), String> = with_retry("test", &policy, |_| {
            calls += 1;
            async { Err(RetryError::Permanent("rejected".to_owned())) }
        })
        .await;

        assert_eq!(result, Err("rejected".to_owned()));
        assert_eq!(calls, 1);
    }
}
