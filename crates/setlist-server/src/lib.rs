//! HTTP API for setlist.
//!
//! - TIDAL OAuth (authorization code + PKCE) with cookie-held sessions
//! - Authenticated passthrough to the TIDAL REST API with one
//!   refresh-and-retry on an expired access token
//! - Playlist generation through a chat-completion provider
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use setlist_server::Server;
//!
//! let loaded = setlist_config::load_config(None)?;
//! let server = Server::from_config(&loaded.config)?;
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod forward;
pub mod logging;
pub mod routes;
pub mod session;
pub mod state;
pub mod tidal;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use forward::ForwardError;
pub use logging::request_logging_middleware;
pub use session::{ClientSession, CookiePolicy, SessionCookies};
pub use state::AppState;
pub use tidal::{TidalApi, TidalError, TidalId, TidalUser};

use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
};
use setlist_config::SetlistConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The setlist HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Create a server with clients built from configuration.
    pub fn from_config(config: &SetlistConfig) -> Result<Self> {
        Ok(Self::new(AppState::from_config(config)?))
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(routes::health_routes())
            .nest("/api", self.api_routes())
            // Request logging (inner layer, runs first)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http().make_span_with(logging::request_span));

        let router = match self.cors_layer() {
            Some(cors) => router.layer(cors),
            None => router,
        };

        router.with_state(self.state.clone())
    }

    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            // OAuth
            .route("/tidal/login", get(routes::login_handler))
            .route("/tidal/callback", get(routes::callback_handler))
            .route("/tidal/token", post(routes::token_handler))
            .route("/tidal/logout", post(routes::logout_handler))
            // TIDAL passthrough
            .route("/tidal/user", get(routes::user_handler))
            .route(
                "/tidal/playlists",
                get(routes::list_playlists_handler).post(routes::create_playlist_handler),
            )
            .route(
                "/tidal/playlists/{id}/tracks",
                get(routes::playlist_tracks_handler).post(routes::add_tracks_handler),
            )
            .route("/tidal/search", get(routes::search_handler))
            // Generation
            .route("/chat", post(routes::chat_handler))
            .route("/playlist/generate", post(routes::generate_handler))
    }

    /// CORS for a separately served UI. Credentials are allowed, so origins
    /// must be listed explicitly.
    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return None;
        }

        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        )
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
