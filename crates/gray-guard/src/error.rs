//! Error types for the gray guard
//!
//! Every variant is an operational failure: the gate could not be
//! evaluated. Threshold breaches are results, not errors.

use thiserror::Error;

/// Main error type for guard operations
#[derive(Error, Debug)]
pub enum GuardError {
    /// Invalid input data or arguments
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Connection, DNS or protocol failure
    #[error("request failed: {0}")]
    Transport(String),

    /// Per-request deadline exceeded
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-2xx HTTP response
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Envelope carried a non-success code
    #[error("api error: code={code} message={message}")]
    Api { code: String, message: String },

    /// Response body is not a JSON envelope
    #[error("invalid response payload: {0}")]
    InvalidEnvelope(String),

    /// Envelope `data` is not a keyed structure
    #[error("invalid response data: {0}")]
    InvalidPayload(String),
}

impl GuardError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        GuardError::InvalidInput(msg.into())
    }

    /// Stable label for metrics and decision records
    pub fn kind(&self) -> &'static str {
        match self {
            GuardError::InvalidInput(_) => "invalid_input",
            GuardError::Transport(_) => "transport",
            GuardError::Timeout(_) => "timeout",
            GuardError::HttpStatus { .. } => "http_status",
            GuardError::Api { .. } => "api",
            GuardError::InvalidEnvelope(_) => "invalid_envelope",
            GuardError::InvalidPayload(_) => "invalid_payload",
        }
    }
}

impl From<reqwest::Error> for GuardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GuardError::Timeout(err.to_string())
        } else {
            GuardError::Transport(err.to_string())
        }
    }
}

/// Result type alias for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GuardError::HttpStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");

        let err = GuardError::Api {
            code: "500".to_string(),
            message: "internal".to_string(),
        };
        assert_eq!(err.to_string(), "api error: code=500 message=internal");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(GuardError::invalid_input("x").kind(), "invalid_input");
        assert_eq!(GuardError::Timeout("x".into()).kind(), "timeout");
        assert_eq!(GuardError::InvalidPayload("x".into()).kind(), "invalid_payload");
    }
}
