//! OAuth 2.0 authorization-code flow against the TIDAL auth server.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// Default TIDAL auth server base URL.
pub const TIDAL_AUTH_BASE: &str = "https://auth.tidal.com/v1";

/// Default redirect URI for local development.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/api/tidal/callback";

/// Default scope requested at login.
pub const DEFAULT_SCOPE: &str = "user.read";

/// Access token lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// OAuth client configuration.
///
/// Client id and secret are optional so a half-configured deployment can
/// still start; each operation checks for what it needs.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scope: String,
    pub timeout: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::tidal(TIDAL_AUTH_BASE)
    }
}

impl OAuthConfig {
    /// Create a config for a TIDAL-compatible auth server rooted at `auth_base`.
    pub fn tidal(auth_base: &str) -> Self {
        let base = auth_base.trim_end_matches('/');
        Self {
            client_id: None,
            client_secret: None,
            authorize_url: format!("{}/oauth2/authorize", base),
            token_url: format!("{}/oauth2/token", base),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the client id.
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the client secret.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the redirect URI registered with the provider.
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Set the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the outbound request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Client id, if configured and non-empty.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Both halves of the client credentials, or a config error.
    pub fn credentials(&self) -> Result<ClientCredentials> {
        let secret = self.client_secret.as_deref().filter(|s| !s.is_empty());
        match (self.client_id(), secret) {
            (Some(id), Some(secret)) => Ok(ClientCredentials {
                client_id: id.to_string(),
                client_secret: secret.to_string(),
            }),
            _ => Err(OAuthError::Config(
                "TIDAL client id and secret must both be configured".to_string(),
            )),
        }
    }
}

/// Client id/secret pair used for HTTP Basic auth at the token endpoint.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Build the authorization URL for the OAuth flow.
pub fn build_authorization_url(
    config: &OAuthConfig,
    client_id: &str,
    challenge: &str,
    state: &str,
) -> String {
    let params = [
        ("client_id", client_id),
        ("response_type", "code"),
        ("redirect_uri", &config.redirect_uri),
        ("scope", &config.scope),
        ("state", state),
        ("code_challenge_method", "S256"),
        ("code_challenge", challenge),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Tokens returned from a code exchange or refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl OAuthTokens {
    /// Lifetime of the access token in seconds, defaulting to one hour.
    pub fn expires_in_or_default(&self) -> u64 {
        match self.expires_in {
            Some(0) | None => DEFAULT_EXPIRES_IN,
            Some(secs) => secs,
        }
    }
}

impl std::fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// HTTP client for the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: Client,
    config: OAuthConfig,
}

impl TokenClient {
    /// Create a token client with the given configuration.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OAuthError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange an authorization code (plus PKCE verifier) for tokens.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<OAuthTokens> {
        let credentials = self.config.credentials()?;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];
        self.post_token(&credentials, &form).await
    }

    /// Exchange a refresh token for a new access token (and possibly a rotated refresh token).
    pub async fn refresh(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let credentials = self.config.credentials()?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.post_token(&credentials, &form).await
    }

    async fn post_token(
        &self,
        credentials: &ClientCredentials,
        form: &[(&str, &str)],
    ) -> Result<OAuthTokens> {
        let grant_type = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        tracing::debug!(grant_type, url = %self.config.token_url, "Requesting tokens");

        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Serialization(format!("Failed to parse token response: {}", e)))
    }
}
