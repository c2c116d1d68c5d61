//! API call errors and how they map onto retry shapes.

use std::fmt;

use serde_json::Value;

use crate::retry::{AppErrorCode, Classify, ErrorShape};

/// Error from a single API call attempt.
#[derive(Debug)]
pub enum ApiError {
    /// Base URL or procedure did not form a valid URL.
    Url(url::ParseError),
    /// libcurl could not complete the transfer (connect, DNS, timeout, ...).
    Transport(curl::Error),
    /// Server answered with a non-2xx status.
    Status {
        status: u16,
        message: String,
        /// Application error code from the body (e.g. `"TOO_MANY_REQUESTS"`).
        code: Option<String>,
        /// Parsed error body, `Null` if it was not JSON.
        details: Value,
    },
    /// Request or response body was not valid JSON.
    Json(serde_json::Error),
    /// The blocking transfer task panicked or was cancelled.
    Join(String),
}

impl ApiError {
    /// HTTP status for `Status` errors, 0 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            _ => 0,
        }
    }

    /// Build a `Status` error from a non-2xx response body.
    ///
    /// Accepts a flat `{"message", "code"}` body as well as the tRPC envelope
    /// `{"error": {"message", "data": {"code"}}}` (optionally nested under `json`).
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let details: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let envelope = details
            .get("error")
            .map(|e| e.get("json").unwrap_or(e));

        let message = details
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| envelope.and_then(|e| e.get("message")).and_then(Value::as_str))
            .unwrap_or("Request failed")
            .to_string();

        let code = details
            .get("code")
            .and_then(Value::as_str)
            .or_else(|| envelope.and_then(|e| e.pointer("/data/code")).and_then(Value::as_str))
            .or_else(|| envelope.and_then(|e| e.get("code")).and_then(Value::as_str))
            .map(str::to_string);

        ApiError::Status {
            status,
            message,
            code,
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Url(e) => write!(f, "invalid URL: {}", e),
            ApiError::Transport(e) => write!(f, "{}", e),
            ApiError::Status {
                status, message, ..
            } => write!(f, "{} (Status: {})", message, status),
            ApiError::Json(e) => write!(f, "invalid JSON: {}", e),
            ApiError::Join(msg) => write!(f, "request task failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Url(e) => Some(e),
            ApiError::Transport(e) => Some(e),
            ApiError::Json(e) => Some(e),
            ApiError::Status { .. } | ApiError::Join(_) => None,
        }
    }
}

/// Shape of a curl failure: connectivity faults are `Network`, timeouts structured.
pub fn transport_shape(e: &curl::Error) -> ErrorShape {
    if e.is_operation_timedout() {
        return ErrorShape::Structured(AppErrorCode::Timeout);
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorShape::Network;
    }
    ErrorShape::Message(e.to_string())
}

impl Classify for ApiError {
    fn shape(&self) -> ErrorShape {
        match self {
            ApiError::Transport(e) => transport_shape(e),
            ApiError::Status { code: Some(c), .. } => {
                ErrorShape::Structured(AppErrorCode::from_code(c))
            }
            // Only the status itself; the server's message may carry unrelated numbers.
            ApiError::Status { code: None, status, .. } => {
                ErrorShape::Message(format!("Status: {}", status))
            }
            ApiError::Url(_) | ApiError::Json(_) | ApiError::Join(_) => ErrorShape::Untyped,
        }
    }
}
