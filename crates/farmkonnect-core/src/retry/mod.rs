//! Retry and backoff policy.
//!
//! This module encapsulates error classification (connectivity faults,
//! timeouts, throttling, server faults) and exponential backoff with jitter
//! so that every client call shares one consistent retry contract.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{
    classify, classify_code, classify_status, status_from_message, AppErrorCode, Classify,
    ErrorShape,
};
pub use error::{PolicyError, RetryError};
pub use policy::{
    ErrorKind, RetryDecision, RetryPolicy, DEFAULT_RETRYABLE_STATUSES, JITTER_FRACTION,
};
pub use run::{
    invoke, AttemptOutcome, InvocationAttempt, RetryEvent, RetryObserver, RetryingInvoker,
};

/// Cancellation handle accepted by [`RetryingInvoker::with_cancellation`].
pub use tokio_util::sync::CancellationToken;
