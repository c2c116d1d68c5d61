//! Retry loop: run an async operation until success or the policy says stop.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::classify::Classify;
use super::error::RetryError;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(ErrorKind),
}

/// One try of the operation within an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationAttempt {
    /// 0-based; contiguous within an invocation.
    pub index: u32,
    /// Time slept before this attempt started (zero for the first).
    pub delay_before: Duration,
    pub outcome: AttemptOutcome,
}

/// Reported once per retry, before the inter-attempt sleep.
#[derive(Debug, Clone)]
pub struct RetryEvent {
    /// The attempt that just failed.
    pub attempt: InvocationAttempt,
    /// Delay before the next attempt.
    pub delay: Duration,
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// Display text of the failure.
    pub message: String,
}

impl RetryEvent {
    /// 1-based number of the failed attempt.
    pub fn attempt_number(&self) -> u32 {
        self.attempt.index + 1
    }
}

pub type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Wraps async operations with bounded retry, exponential backoff and jitter.
///
/// Holds no per-call state, so one invoker can serve concurrent invocations.
#[derive(Clone, Default)]
pub struct RetryingInvoker {
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
    observer: Option<RetryObserver>,
}

impl fmt::Debug for RetryingInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingInvoker")
            .field("policy", &self.policy)
            .field("cancellable", &self.cancel.is_some())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl RetryingInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: None,
            observer: None,
        }
    }

    /// Abort (instead of sleeping or starting another attempt) once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Call `observer` once per retry with the attempt, delay and error message.
    pub fn on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&RetryEvent) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// runs out of attempts, or the invocation is cancelled.
    ///
    /// The error returned in `RetryError::Operation` is always the one from the
    /// last attempt made.
    pub async fn invoke<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.policy.validate().map_err(RetryError::InvalidPolicy)?;

        let mut attempt = 0u32;
        let mut delay_before = Duration::ZERO;
        loop {
            if self.is_cancelled() {
                tracing::debug!(attempt, "invocation cancelled before attempt");
                return Err(RetryError::Cancelled);
            }

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        let record = InvocationAttempt {
                            index: attempt,
                            delay_before,
                            outcome: AttemptOutcome::Succeeded,
                        };
                        tracing::debug!(?record, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let kind = self.policy.classify(&err);
            let delay = match self.policy.decide(attempt, kind) {
                RetryDecision::NoRetry => {
                    tracing::debug!(attempt, ?kind, "not retrying: {}", err);
                    return Err(RetryError::Operation(err));
                }
                RetryDecision::RetryAfter(d) => d,
            };

            let event = RetryEvent {
                attempt: InvocationAttempt {
                    index: attempt,
                    delay_before,
                    outcome: AttemptOutcome::Failed(kind),
                },
                delay,
                kind,
                message: err.to_string(),
            };
            tracing::warn!(
                attempt = event.attempt_number(),
                delay_ms = delay.as_millis() as u64,
                ?kind,
                "retrying after error: {}",
                event.message
            );
            if let Some(observer) = &self.observer {
                observer(&event);
            }

            if !self.pause(delay).await {
                tracing::debug!(attempt, "invocation cancelled during backoff");
                return Err(RetryError::Cancelled);
            }
            delay_before = delay;
            attempt += 1;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleep for `delay`; returns false if cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        match &self.cancel {
            None => {
                tokio::time::sleep(delay).await;
                true
            }
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(delay) => true,
                }
            }
        }
    }
}

/// Run `operation` under `policy` without cancellation or an observer.
pub async fn invoke<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    RetryingInvoker::new(policy.clone()).invoke(operation).await
}
