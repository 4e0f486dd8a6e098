//! Retry policy
//!
//! A failed attempt is reduced to a [`RetryDecision`] by a pure function;
//! the single retry loop in [`HttpClient::send`](super::HttpClient::send)
//! consumes it.

use super::response::ResponseEnvelope;
use crate::error::is_retryable_status;
use std::time::Duration;

/// What to do after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Surface the response as-is (or as an HTTP error)
    NoRetry,
    /// Retry after exactly this long
    RetryAfter(Duration),
    /// Retry after the policy's exponential backoff
    RetryDefault,
}

impl RetryDecision {
    /// Combine a retryability verdict with an optional user-defined wait.
    ///
    /// A zero wait counts as no wait, falling back to the default tier.
    pub fn classify(should_retry: bool, backoff: Option<Duration>) -> Self {
        if !should_retry {
            return Self::NoRetry;
        }
        match backoff {
            Some(wait) if !wait.is_zero() => Self::RetryAfter(wait),
            _ => Self::RetryDefault,
        }
    }

    pub fn is_retry(&self) -> bool {
        !matches!(self, Self::NoRetry)
    }
}

/// Per-resource hooks that decide how responses are treated
pub trait ResponseClassifier: Send + Sync {
    /// Whether the response is transient. Defaults to 429 and 5xx.
    fn should_retry(&self, response: &ResponseEnvelope) -> bool {
        is_retryable_status(response.status())
    }

    /// Explicit wait before retrying this response, if any
    fn backoff_time(&self, _response: &ResponseEnvelope) -> Option<Duration> {
        None
    }

    /// Whether non-retryable 4xx/5xx responses become errors
    fn raise_on_http_errors(&self) -> bool {
        true
    }

    fn retry_decision(&self, response: &ResponseEnvelope) -> RetryDecision {
        RetryDecision::classify(self.should_retry(response), self.backoff_time(response))
    }
}

/// Classifier with every default
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ResponseClassifier for DefaultClassifier {}

/// Attempt and time budget for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Wall-clock ceiling across all attempts
    pub max_time: Duration,
    /// Base of the exponential backoff
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_time: Duration::from_secs(600),
            backoff_factor: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_time: Duration, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            max_time,
            backoff_factor,
        }
    }

    /// Total attempts allowed, including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// `factor * 2^(attempt - 1)` for a 1-based attempt number
    pub fn default_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }

    /// Wait dictated by a retry decision
    pub fn delay_for(&self, decision: RetryDecision, attempt: u32) -> Duration {
        match decision {
            RetryDecision::RetryAfter(wait) => wait,
            RetryDecision::RetryDefault | RetryDecision::NoRetry => self.default_backoff(attempt),
        }
    }

    /// Wait before the next attempt, or `None` once either budget is spent.
    ///
    /// Waits are truncated to the remaining time budget.
    pub fn next_wait(&self, attempt: u32, elapsed: Duration, delay: Duration) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        let remaining = self.max_time.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }
        Some(delay.min(remaining))
    }
}
