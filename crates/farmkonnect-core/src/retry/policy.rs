use rand::Rng;
use std::collections::BTreeSet;
use std::time::Duration;

use super::classify::{self, Classify};
use super::error::PolicyError;

/// Fraction of the base delay used as the upper bound of the random jitter.
pub const JITTER_FRACTION: f64 = 0.1;

/// HTTP statuses treated as transient when no structured error code is available.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// High-level classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport could not reach the server (refused, reset, DNS).
    Network,
    /// The server or transport reported that the operation timed out.
    Timeout,
    /// Rate limited (e.g. 429 / TOO_MANY_REQUESTS).
    TooManyRequests,
    /// Transient server-side fault (5xx / INTERNAL_SERVER_ERROR).
    ServerInternal,
    /// Client errors, validation failures and anything unrecognized.
    NotRetryable,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::NotRetryable)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with jitter and a hard cap.
///
/// `max_retries` counts every attempt, including the first one: with
/// `max_retries = 3` the operation runs at most three times.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_retries: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single delay, jitter included.
    pub max_delay: Duration,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
    /// Status codes that count as transient when parsed from an error message.
    pub retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Check the preconditions an invocation relies on.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_retries < 1 {
            return Err(PolicyError::NoAttempts);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(self.backoff_multiplier));
        }
        Ok(())
    }

    /// Classify an operation error against this policy's status set.
    pub fn classify<E: Classify + ?Sized>(&self, err: &E) -> ErrorKind {
        classify::classify(&err.shape(), &self.retryable_statuses)
    }

    /// Un-jittered delay for `attempt` (0-based), clamped to `max_delay`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.delay_with_sample(attempt, 0.0)
    }

    /// Jittered delay slept after the failed attempt `attempt` (0-based).
    ///
    /// A fresh jitter sample is drawn on every call.
    pub fn delay(&self, attempt: u32) -> Duration {
        let sample: f64 = rand::rng().random();
        self.delay_with_sample(attempt, sample)
    }

    /// `min(max_delay, base + sample * 0.1 * base)` with
    /// `base = initial_delay * multiplier^attempt`.
    ///
    /// The clamp is applied after jitter is added, so the result never
    /// exceeds `max_delay` and jitter vanishes once the base reaches the cap.
    pub fn delay_with_sample(&self, attempt: u32, sample: f64) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exp);
        let jitter = sample.clamp(0.0, 1.0) * JITTER_FRACTION * base;
        let capped = (base + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Decide whether to retry after attempt `attempt` (0-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt.saturating_add(1) >= self.max_retries {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::NotRetryable => RetryDecision::NoRetry,
            ErrorKind::Network
            | ErrorKind::Timeout
            | ErrorKind::TooManyRequests
            | ErrorKind::ServerInternal => RetryDecision::RetryAfter(self.delay(attempt)),
        }
    }
}
