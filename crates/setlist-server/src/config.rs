//! Server configuration.

use std::net::{IpAddr, SocketAddr};

use setlist_config::ServerSection;

use crate::error::{Result, ServerError};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Mark session cookies `Secure`. On in production.
    pub secure_cookies: bool,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            secure_cookies: false,
            request_logging: true,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[server]` config section.
    pub fn from_section(section: &ServerSection) -> Result<Self> {
        let ip: IpAddr = section.bind.parse().map_err(|e| {
            ServerError::Config(format!("Invalid bind address '{}': {}", section.bind, e))
        })?;
        Ok(Self {
            bind_address: SocketAddr::new(ip, section.port),
            secure_cookies: section.environment.is_production(),
            request_logging: section.request_logging,
            cors_origins: section.cors_origins.clone(),
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable `Secure` cookies.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}
