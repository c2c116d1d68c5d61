//! Map failures onto retry kinds.
//!
//! Errors describe themselves through [`Classify`] as one of a few known
//! shapes; [`classify`] then applies a fixed first-match order: transport
//! faults, structured application codes, a status code parsed from the
//! message, and finally "unknown", which is never retried.

use std::collections::BTreeSet;
use std::io;

use super::policy::ErrorKind;

/// Application-level error codes carried by tRPC error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    ParseError,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    UnprocessableContent,
    TooManyRequests,
    ClientClosedRequest,
    InternalServerError,
    NotImplemented,
    /// A code we do not recognize; still structured, so never guessed at.
    Other,
}

impl AppErrorCode {
    /// Parse a wire code such as `"TOO_MANY_REQUESTS"`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "PARSE_ERROR" => Self::ParseError,
            "BAD_REQUEST" => Self::BadRequest,
            "UNAUTHORIZED" => Self::Unauthorized,
            "FORBIDDEN" => Self::Forbidden,
            "NOT_FOUND" => Self::NotFound,
            "METHOD_NOT_SUPPORTED" => Self::MethodNotSupported,
            "TIMEOUT" => Self::Timeout,
            "CONFLICT" => Self::Conflict,
            "PRECONDITION_FAILED" => Self::PreconditionFailed,
            "PAYLOAD_TOO_LARGE" => Self::PayloadTooLarge,
            "UNPROCESSABLE_CONTENT" => Self::UnprocessableContent,
            "TOO_MANY_REQUESTS" => Self::TooManyRequests,
            "CLIENT_CLOSED_REQUEST" => Self::ClientClosedRequest,
            "INTERNAL_SERVER_ERROR" => Self::InternalServerError,
            "NOT_IMPLEMENTED" => Self::NotImplemented,
            _ => Self::Other,
        }
    }
}

/// The known shapes a failure can take, in classification order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorShape {
    /// Connectivity fault: the server could not be reached at all.
    Network,
    /// Structured application error with a code.
    Structured(AppErrorCode),
    /// Generic error with only a human-readable message.
    Message(String),
    /// Nothing usable to inspect.
    Untyped,
}

/// Implemented by operation errors so the retry loop can classify them.
pub trait Classify {
    fn shape(&self) -> ErrorShape;
}

impl Classify for io::Error {
    fn shape(&self) -> ErrorShape {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe => ErrorShape::Network,
            io::ErrorKind::TimedOut => ErrorShape::Structured(AppErrorCode::Timeout),
            _ => ErrorShape::Message(self.to_string()),
        }
    }
}

/// Classify a shape. First match wins; unknown errors are not retried.
pub fn classify(shape: &ErrorShape, retryable_statuses: &BTreeSet<u16>) -> ErrorKind {
    match shape {
        ErrorShape::Network => ErrorKind::Network,
        ErrorShape::Structured(code) => classify_code(*code),
        ErrorShape::Message(text) => match status_from_message(text) {
            Some(status) => classify_status(status, retryable_statuses),
            None => ErrorKind::NotRetryable,
        },
        ErrorShape::Untyped => ErrorKind::NotRetryable,
    }
}

/// Only timeouts, rate limiting and internal faults are transient.
pub fn classify_code(code: AppErrorCode) -> ErrorKind {
    match code {
        AppErrorCode::Timeout => ErrorKind::Timeout,
        AppErrorCode::TooManyRequests => ErrorKind::TooManyRequests,
        AppErrorCode::InternalServerError => ErrorKind::ServerInternal,
        _ => ErrorKind::NotRetryable,
    }
}

/// Classify an HTTP status against the configured retryable set.
pub fn classify_status(status: u16, retryable_statuses: &BTreeSet<u16>) -> ErrorKind {
    if !retryable_statuses.contains(&status) {
        return ErrorKind::NotRetryable;
    }
    match status {
        408 => ErrorKind::Timeout,
        429 => ErrorKind::TooManyRequests,
        _ => ErrorKind::ServerInternal,
    }
}

/// First standalone three-digit number in 100..=599 found in `text`.
pub fn status_from_message(text: &str) -> Option<u16> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i - start == 3 {
            if let Ok(status) = text[start..i].parse::<u16>() {
                if (100..=599).contains(&status) {
                    return Some(status);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::DEFAULT_RETRYABLE_STATUSES;

    fn defaults() -> BTreeSet<u16> {
        DEFAULT_RETRYABLE_STATUSES.into_iter().collect()
    }

    #[test]
    fn network_is_retryable() {
        assert_eq!(classify(&ErrorShape::Network, &defaults()), ErrorKind::Network);
    }

    #[test]
    fn transient_codes_are_retryable() {
        let s = defaults();
        let kind = |c| classify(&ErrorShape::Structured(c), &s);
        assert_eq!(kind(AppErrorCode::Timeout), ErrorKind::Timeout);
        assert_eq!(kind(AppErrorCode::TooManyRequests), ErrorKind::TooManyRequests);
        assert_eq!(kind(AppErrorCode::InternalServerError), ErrorKind::ServerInternal);
    }

    #[test]
    fn other_codes_fail_fast() {
        let s = defaults();
        for code in [
            AppErrorCode::BadRequest,
            AppErrorCode::Unauthorized,
            AppErrorCode::NotFound,
            AppErrorCode::Conflict,
            AppErrorCode::NotImplemented,
            AppErrorCode::Other,
        ] {
            assert_eq!(
                classify(&ErrorShape::Structured(code), &s),
                ErrorKind::NotRetryable,
                "{code:?}"
            );
        }
    }

    #[test]
    fn structured_code_wins_over_message_status() {
        // A NOT_FOUND error is not retried even if a 503 shows up somewhere.
        assert_eq!(
            classify(&ErrorShape::Structured(AppErrorCode::from_code("NOT_FOUND")), &defaults()),
            ErrorKind::NotRetryable
        );
    }

    #[test]
    fn message_status_uses_configured_set() {
        let s = defaults();
        let kind = |m: &str| classify(&ErrorShape::Message(m.to_string()), &s);
        assert_eq!(kind("Service Unavailable (Status: 503)"), ErrorKind::ServerInternal);
        assert_eq!(kind("HTTP 429"), ErrorKind::TooManyRequests);
        assert_eq!(kind("request failed with 408"), ErrorKind::Timeout);
        assert_eq!(kind("Not Found (Status: 404)"), ErrorKind::NotRetryable);
        assert_eq!(kind("no digits here"), ErrorKind::NotRetryable);

        let custom: BTreeSet<u16> = [404].into_iter().collect();
        assert_eq!(
            classify(&ErrorShape::Message("HTTP 404".into()), &custom),
            ErrorKind::ServerInternal
        );
        assert_eq!(
            classify(&ErrorShape::Message("HTTP 503".into()), &custom),
            ErrorKind::NotRetryable
        );
    }

    #[test]
    fn untyped_is_not_retryable() {
        assert_eq!(classify(&ErrorShape::Untyped, &defaults()), ErrorKind::NotRetryable);
    }

    #[test]
    fn status_parse_skips_longer_numbers() {
        assert_eq!(status_from_message("timed out after 1500ms, got 502"), Some(502));
        assert_eq!(status_from_message("id 12345"), None);
        assert_eq!(status_from_message("code 099 then 600 then 500"), Some(500));
        assert_eq!(status_from_message("503"), Some(503));
        assert_eq!(status_from_message(""), None);
    }

    #[test]
    fn code_parse_unknown_is_other() {
        assert_eq!(AppErrorCode::from_code("TIMEOUT"), AppErrorCode::Timeout);
        assert_eq!(AppErrorCode::from_code(" TOO_MANY_REQUESTS "), AppErrorCode::TooManyRequests);
        assert_eq!(AppErrorCode::from_code("TEAPOT"), AppErrorCode::Other);
    }

    #[test]
    fn io_errors() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(refused.shape(), ErrorShape::Network);
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(timed_out.shape(), ErrorShape::Structured(AppErrorCode::Timeout));
        let other = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(other.shape(), ErrorShape::Message("denied".into()));
    }
}
