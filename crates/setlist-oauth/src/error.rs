//! Error types for the OAuth client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur during the OAuth flow.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network/HTTP transport error.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Client credentials are missing.
    #[error("Config error: {0}")]
    Config(String),

    /// Response could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OAuthError {
    /// HTTP status returned by the provider, if the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            OAuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
