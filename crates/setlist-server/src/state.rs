//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use setlist_config::SetlistConfig;
use setlist_llm::{CompletionClient, CompletionConfig, SharedGenerator};
use setlist_oauth::{OAuthConfig, TokenClient};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::session::{CookiePolicy, SessionCookies};
use crate::tidal::TidalApi;

/// Application state shared across all handlers.
///
/// Read-only after construction; per-user state lives in cookies.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// OAuth token endpoint client.
    pub tokens: Arc<TokenClient>,

    /// TIDAL REST client.
    pub tidal: Arc<TidalApi>,

    /// Completion backend for playlist generation.
    pub generator: SharedGenerator,
}

impl AppState {
    /// Create application state from pre-built clients.
    pub fn new(
        config: ServerConfig,
        tokens: TokenClient,
        tidal: TidalApi,
        generator: SharedGenerator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            tidal: Arc::new(tidal),
            generator,
        }
    }

    /// Build every client from the loaded configuration.
    ///
    /// Missing credentials are not an error here; the affected endpoints
    /// report them per request.
    pub fn from_config(config: &SetlistConfig) -> Result<Self> {
        let server = ServerConfig::from_section(&config.server)?;

        let tidal_cfg = &config.tidal;
        let timeout = Duration::from_secs(tidal_cfg.timeout_secs);
        let mut oauth = OAuthConfig::tidal(&tidal_cfg.auth_base_url)
            .with_redirect_uri(&tidal_cfg.redirect_uri)
            .with_scope(&tidal_cfg.scope)
            .with_timeout(timeout);
        oauth.client_id = tidal_cfg.client_id.clone();
        oauth.client_secret = tidal_cfg.client_secret.clone();

        let tokens = TokenClient::new(oauth)
            .map_err(|e| ServerError::Internal(format!("Failed to build token client: {}", e)))?;
        let tidal = TidalApi::new(&tidal_cfg.api_base_url, timeout)
            .map_err(|e| ServerError::Internal(format!("Failed to build TIDAL client: {}", e)))?;

        let completion_cfg = &config.completion;
        let completion = CompletionClient::new(CompletionConfig {
            api_key: completion_cfg.api_key.clone(),
            base_url: completion_cfg.base_url.clone(),
            model: completion_cfg.model.clone(),
            temperature: completion_cfg.temperature,
            max_tokens: completion_cfg.max_tokens,
            timeout: Duration::from_secs(completion_cfg.timeout_secs),
        })
        .map_err(|e| ServerError::Internal(format!("Failed to build completion client: {}", e)))?;

        if tidal_cfg.client_id.is_none() {
            tracing::warn!("TIDAL client id not configured; login will fail");
        }
        if completion_cfg.api_key.is_none() {
            tracing::warn!("Completion API key not configured; generation will fail");
        }

        Ok(Self::new(server, tokens, tidal, Arc::new(completion)))
    }

    /// Empty cookie set carrying this server's cookie policy.
    pub fn session_cookies(&self) -> SessionCookies {
        SessionCookies::new(CookiePolicy {
            secure: self.config.secure_cookies,
        })
    }
}
