//! OAuth 2.0 authorization-code flow with PKCE for TIDAL accounts.
//!
//! # Components
//!
//! - [`pkce`]: verifier/challenge derivation and CSRF state tokens
//! - [`oauth`]: client configuration, authorize URL, token exchange/refresh

pub mod error;
pub mod oauth;
pub mod pkce;

pub use error::{OAuthError, Result};
pub use oauth::{ClientCredentials, OAuthConfig, OAuthTokens, TokenClient, build_authorization_url};
pub use pkce::{PkceChallenge, generate_state};
