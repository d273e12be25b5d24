//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server error type.
///
/// The message carried by each variant is what the client sees; upstream
/// bodies and transport details are logged where they occur and never put
/// in here.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No usable session cookies, or refresh was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing client credentials or API keys.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream provider answered with a non-success status.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ServerError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            ServerError::Upstream { status, .. } => (*status, "upstream_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    fn public_message(&self) -> &str {
        match self {
            ServerError::Unauthorized(msg)
            | ServerError::BadRequest(msg)
            | ServerError::Config(msg)
            | ServerError::Internal(msg) => msg,
            ServerError::Upstream { message, .. } => message,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), code, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status.as_u16(), code, error = %self, "Client error");
        }

        let body = ErrorResponse {
            error: self.public_message().to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
