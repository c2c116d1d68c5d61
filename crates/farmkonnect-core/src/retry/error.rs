//! Errors surfaced by a retrying invocation.

use std::error::Error;
use std::fmt;

/// A retry policy that violates the invocation preconditions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("max_retries must allow at least one attempt")]
    NoAttempts,
    #[error("backoff multiplier must be a finite number >= 1, got {0}")]
    InvalidMultiplier(f64),
}

/// Terminal outcome of a failed invocation.
///
/// `Operation` carries the error from the final attempt exactly as the
/// operation produced it, and is transparent: its `Display` and `source` are
/// those of the wrapped error, so an error chain shows the operation's failure
/// once.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The last attempt failed and no further attempt is allowed.
    Operation(E),
    /// The invocation was cancelled before the next attempt could start.
    Cancelled,
    /// The policy was rejected before the first attempt.
    InvalidPolicy(PolicyError),
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }

    /// The operation's own error, if that is what ended the invocation.
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled | RetryError::InvalidPolicy(_) => None,
        }
    }

    pub fn operation(&self) -> Option<&E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled | RetryError::InvalidPolicy(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(e) => write!(f, "{}", e),
            RetryError::Cancelled => write!(f, "invocation cancelled"),
            RetryError::InvalidPolicy(_) => write!(f, "invalid retry policy"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            // Transparent, like `#[error(transparent)]`.
            RetryError::Operation(e) => e.source(),
            RetryError::Cancelled => None,
            RetryError::InvalidPolicy(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl Error for Refused {}

    #[derive(Debug)]
    struct CallFailed(Refused);

    impl fmt::Display for CallFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "farms.list failed")
        }
    }

    impl Error for CallFailed {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn operation_error_is_transparent() {
        let err = RetryError::Operation(CallFailed(Refused));
        assert_eq!(err.to_string(), "farms.list failed");
        let source = err.source().expect("inner source is forwarded");
        assert!(source.is::<Refused>());
    }

    #[test]
    fn chain_prints_each_error_once() {
        let err = RetryError::Operation(CallFailed(Refused));
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "farms.list failed: connection refused"
        );

        let err: RetryError<CallFailed> = RetryError::InvalidPolicy(PolicyError::NoAttempts);
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "invalid retry policy: max_retries must allow at least one attempt"
        );
    }

    #[test]
    fn cancelled_has_no_source() {
        let err: RetryError<CallFailed> = RetryError::Cancelled;
        assert!(err.is_cancelled());
        assert!(err.source().is_none());
        assert!(err.into_operation().is_none());
    }
}
