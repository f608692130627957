//! Client Error Types
//!
//! Every failure a tournament API call can produce, from transport errors
//! to "already completed" conflicts reported by the server.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the tournament API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// 401/403, or an admin call made without credentials
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Server says the action was already done (checked in, paid, ...)
    #[error("Already completed: {0}")]
    AlreadyCompleted(String),

    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an error from a non-success response.
    ///
    /// The body is parsed leniently: JSON error envelopes contribute their
    /// message and completion flags, anything else is used as plain text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        let message = envelope
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string());

        if envelope.is_already_completed() {
            return ApiError::AlreadyCompleted(message);
        }

        match status {
            401 | 403 => ApiError::Unauthorized(message),
            _ => ApiError::Status { status, message },
        }
    }

    /// Whether the request never produced an HTTP response
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    /// Short message suitable for a notice or error panel
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) | ApiError::Timeout => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Unauthorized(_) => "You are not authorized to do that.".to_string(),
            ApiError::Status { status, .. } if *status == 404 => "Not found.".to_string(),
            ApiError::Status { .. } | ApiError::Decode(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            ApiError::AlreadyCompleted(msg) | ApiError::Validation(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Result type for client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by the tournament API
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    already_checked_in: bool,
    #[serde(default)]
    already_paid: bool,
    #[serde(default)]
    already_completed: bool,
}

impl ErrorEnvelope {
    fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .or_else(|| self.errors.first().map(String::as_str))
    }

    fn is_already_completed(&self) -> bool {
        self.already_checked_in || self.already_paid || self.already_completed
    }
}
