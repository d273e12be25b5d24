//! Playlist generation endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use setlist_llm::{LlmError, PlaylistParams, Song};

use crate::error::{Result, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// Free-form prompt, sent as-is.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// One song per line, numbering stripped.
    pub playlist: String,
}

/// Response of `POST /api/playlist/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The prompt built from the parameters.
    pub prompt: String,
    pub playlist: String,
    pub songs: Vec<Song>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/chat - Run a raw prompt through the completion provider.
pub async fn chat_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let prompt = request
        .ok()
        .and_then(|Json(r)| r.prompt)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Prompt is required".to_string()))?;

    let generated = state
        .generator
        .generate(&prompt)
        .await
        .map_err(generation_error)?;

    Ok(Json(ChatResponse {
        playlist: generated.playlist,
    }))
}

/// POST /api/playlist/generate - Build a prompt from wizard parameters and generate.
pub async fn generate_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<PlaylistParams>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(params) = request.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let prompt = params.build_prompt().map_err(generation_error)?;

    let generated = state
        .generator
        .generate(&prompt)
        .await
        .map_err(generation_error)?;

    tracing::info!(
        genres = ?params.genres,
        songs = generated.songs.len(),
        "Playlist generated"
    );

    Ok(Json(GenerateResponse {
        prompt,
        playlist: generated.playlist,
        songs: generated.songs,
    }))
}

/// Map completion failures to responses. Provider statuses pass through.
fn generation_error(err: LlmError) -> ServerError {
    match err {
        LlmError::Config(msg) => ServerError::Config(msg),
        LlmError::InvalidRequest(msg) => ServerError::BadRequest(msg),
        LlmError::Backend { status, message } => ServerError::Upstream {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            message,
        },
        other => {
            tracing::error!(error = %other, "Playlist generation failed");
            ServerError::Internal("Failed to generate playlist".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_status_passes_through() {
        let err = generation_error(LlmError::Backend {
            status: 429,
            message: "rate limited".to_string(),
        });
        match err {
            ServerError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_is_generic() {
        let err = generation_error(LlmError::EmptyResponse);
        assert!(matches!(err, ServerError::Internal(ref m) if m == "Failed to generate playlist"));
    }

    #[test]
    fn test_invalid_request_is_bad_request() {
        let err = generation_error(LlmError::InvalidRequest("At least one genre is required".into()));
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
