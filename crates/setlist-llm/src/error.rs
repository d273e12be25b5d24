//! Error types for the completion client.

use thiserror::Error;

/// Result type alias using the LLM error type.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors from prompt validation or the completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing API key or unusable settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request parameters failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure talking to the provider.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Provider answered but without any message content.
    #[error("No content in response")]
    EmptyResponse,
}

impl LlmError {
    /// Upstream HTTP status, for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Network(e.to_string())
    }
}
