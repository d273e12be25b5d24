//! OpenAI-compatible chat-completion client.
//!
//! Perplexity's `/chat/completions` endpoint is the default target; any
//! provider speaking the same request/response shape works.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::playlist::GeneratedPlaylist;
use crate::prompt::SYSTEM_PROMPT;

/// Default completion API base URL.
const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the completion client.
#[derive(Clone)]
pub struct CompletionConfig {
    /// Bearer API key. Requests fail with a config error when unset.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "sonar".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            timeout: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CompletionConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator trait
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a prompt into playlist text.
#[async_trait]
pub trait PlaylistGenerator: Send + Sync {
    /// Run one completion and return the raw message content.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Run one completion and normalize the result.
    async fn generate(&self, prompt: &str) -> Result<GeneratedPlaylist> {
        let content = self.complete(prompt).await?;
        Ok(GeneratedPlaylist::from_content(&content))
    }
}

/// Shared generator handle.
pub type SharedGenerator = Arc<dyn PlaylistGenerator>;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP client
// ─────────────────────────────────────────────────────────────────────────────

/// Chat-completion client.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a client with the given configuration.
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn to_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn handle_response(response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    format!(
                        "API request failed: {}",
                        status.canonical_reason().unwrap_or("Unknown")
                    )
                });
            tracing::warn!(status = %status.as_u16(), body = %body, "Completion request failed");
            return Err(LlmError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl PlaylistGenerator for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::Config("Completion API key is not configured".to_string()))?;

        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidRequest("Prompt is required".to_string()));
        }

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&self.to_request(prompt))
            .send()
            .await?;

        Self::handle_response(response).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CompletionClient {
        CompletionClient::new(
            CompletionConfig::default()
                .with_api_key("pplx-test")
                .with_base_url(server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_normalizes_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer pplx-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "sonar",
                "max_tokens": 500
            })))
            .and(body_string_contains("Jazz please"))
            .and(body_string_contains("music playlist generator"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "1. A - B (1999)\n\n2. C - D (2001)"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generated = client_for(&server).generate("Jazz please").await.unwrap();
        assert_eq!(generated.playlist, "A - B (1999)\nC - D (2001)");
        assert_eq!(generated.songs[1].year, Some(2001));
    }

    #[tokio::test]
    async fn test_backend_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "slow down"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert!(matches!(err, LlmError::Backend { ref message, .. } if message == "slow down"));
    }

    #[tokio::test]
    async fn test_backend_error_without_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        match err {
            LlmError::Backend { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "API request failed: Service Unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = CompletionClient::new(CompletionConfig::default()).unwrap();
        assert!(matches!(
            client.complete("x").await.unwrap_err(),
            LlmError::Config(_)
        ));
    }
}
