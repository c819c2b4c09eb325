//! Error types for weft.

use strum::Display;
use thiserror::Error;

/// Primary error type for all weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Endpoint error (status {status}): {message}")]
    Endpoint { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Broad error category for routing recovery logic and user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    RateLimit,
    Unavailable,
    Server,
    Network,
    Configuration,
    Serialization,
    InvalidState,
    Unknown,
}

impl WeftError {
    /// Create an endpoint error from a status code and body text.
    pub fn endpoint(status: u16, message: impl Into<String>) -> Self {
        Self::Endpoint {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidState(_) => ErrorCategory::InvalidState,
            Self::Endpoint { status, .. } => match status {
                429 => ErrorCategory::RateLimit,
                503 => ErrorCategory::Unavailable,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Unknown,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Only consulted before any response-body byte has been consumed; a
    /// failure mid-stream is terminal for the session.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Unavailable
                | ErrorCategory::Server
                | ErrorCategory::Network
        )
    }

    /// The fixed user-facing message for this error, by category.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::RateLimit => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ErrorCategory::Unavailable => {
                "The model is currently unavailable. Please try again in a moment.".to_string()
            }
            ErrorCategory::Server => {
                "An internal server error occurred. Please try again.".to_string()
            }
            _ => match self {
                Self::Endpoint { status, .. } => format!("Server error ({status})"),
                _ => "Something went wrong while streaming the response. Please try again."
                    .to_string(),
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WeftError>;
