//! askme error types

use crate::resilience::CircuitOpen;

/// Validation failure codes surfaced at the HTTP boundary.
pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";

/// askme error types
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    // Input errors
    /// Malformed or out-of-range input. Never retried.
    #[error("invalid input ({code}): {message}")]
    Validation { code: &'static str, message: String },

    // Resilience errors
    /// The named breaker is open and rejected the call without running it.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    // Provider/network errors
    /// The provider answered with a non-success status.
    #[error("upstream status {status}")]
    Upstream { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream call timed out")]
    Timeout,

    // Data errors
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AskError {
    /// Shorthand for a `BAD_REQUEST` validation error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        AskError::Validation {
            code: BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Shorthand for an `INVALID_PARAMS` validation error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        AskError::Validation {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    /// Whether the request handler may retry after this error.
    ///
    /// Only upstream 5xx answers qualify. Breaker rejections, timeouts and
    /// connection failures are surfaced without a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AskError::Upstream { status } if (500..600).contains(status))
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, AskError::CircuitOpen { .. })
    }

    /// Status code carried by an `Upstream` error.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AskError::Upstream { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<CircuitOpen> for AskError {
    fn from(err: CircuitOpen) -> Self {
        AskError::CircuitOpen { name: err.name }
    }
}

impl From<reqwest::Error> for AskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AskError::Timeout
        } else if err.is_decode() {
            AskError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            AskError::Upstream {
                status: status.as_u16(),
            }
        } else {
            AskError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AskError {
    fn from(err: serde_json::Error) -> Self {
        AskError::Decode(err.to_string())
    }
}

/// Result type alias for askme operations
pub type Result<T> = std::result::Result<T, AskError>;
