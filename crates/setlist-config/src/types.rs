//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable holding the TIDAL client id.
pub const ENV_TIDAL_CLIENT_ID: &str = "TIDAL_CLIENT_ID";
/// Environment variable holding the TIDAL client secret.
pub const ENV_TIDAL_CLIENT_SECRET: &str = "TIDAL_CLIENT_SECRET";
/// Environment variable overriding the OAuth redirect URI.
pub const ENV_TIDAL_REDIRECT_URI: &str = "TIDAL_REDIRECT_URI";
/// Environment variable holding the completion provider API key.
pub const ENV_PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";
/// Environment variable selecting the deployment environment.
pub const ENV_SETLIST_ENV: &str = "SETLIST_ENV";

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetlistConfig {
    pub server: ServerSection,
    pub tidal: TidalSection,
    pub completion: CompletionSection,
    pub logging: LoggingSection,
}

impl SetlistConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// clobber a value from a config file.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_TIDAL_CLIENT_ID) {
            self.tidal.client_id = Some(id);
        }
        if let Some(secret) = get(ENV_TIDAL_CLIENT_SECRET) {
            self.tidal.client_secret = Some(secret);
        }
        if let Some(uri) = get(ENV_TIDAL_REDIRECT_URI) {
            self.tidal.redirect_uri = uri;
        }
        if let Some(key) = get(ENV_PERPLEXITY_API_KEY) {
            self.completion.api_key = Some(key);
        }
        if let Some(env) = get(ENV_SETLIST_ENV) {
            self.server.environment = env.parse()?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment environment. Production turns on `Secure` cookies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" => Ok(Environment::Development),
            other => Err(ConfigError::InvalidValue {
                field: "server.environment".to_string(),
                reason: format!("unknown environment '{}'", other),
            }),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// Log every request with status and duration.
    pub request_logging: bool,
    /// CORS allowed origins (empty = no CORS layer).
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            environment: Environment::Development,
            request_logging: true,
            cors_origins: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TIDAL
// ─────────────────────────────────────────────────────────────────────────────

/// TIDAL OAuth client and API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TidalSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    /// Base URL of the auth server (`/oauth2/authorize`, `/oauth2/token`).
    pub auth_base_url: String,
    /// Base URL of the REST API (`/users/me`, `/search`, ...).
    pub api_base_url: String,
    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TidalSection {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:3000/api/tidal/callback".to_string(),
            scope: "user.read".to_string(),
            auth_base_url: "https://auth.tidal.com/v1".to_string(),
            api_base_url: "https://api.tidal.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────────────────────────

/// AI completion provider settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSection {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for CompletionSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.perplexity.ai".to_string(),
            model: "sonar".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily-rotated JSON logs. `None` disables file logging.
    pub json_dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_dir: None,
        }
    }
}
