//! OAuth endpoints: login redirect, callback, token refresh and logout.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use setlist_oauth::{OAuthError, PkceChallenge, build_authorization_url, generate_state};
use subtle::ConstantTimeEq;

use crate::error::{Result, ServerError};
use crate::forward::refresh_session;
use crate::session::{ClientSession, SessionCookies};
use crate::state::AppState;
use crate::tidal::TidalError;

/// Where the browser lands after a successful callback.
pub const SUCCESS_LOCATION: &str = "/?success=tidal_connected";

/// Body of the token and logout endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Login
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/tidal/login - Start the authorization-code flow.
pub async fn login_handler(State(state): State<AppState>) -> Result<(SessionCookies, Redirect)> {
    let oauth = state.tokens.config();
    let client_id = oauth
        .client_id()
        .ok_or_else(|| ServerError::Config("TIDAL_CLIENT_ID not configured".to_string()))?;

    let pkce = PkceChallenge::generate();
    let csrf = generate_state();
    let url = build_authorization_url(oauth, client_id, &pkce.challenge, &csrf);

    let mut cookies = state.session_cookies();
    cookies.set_pkce(&csrf, &pkce.verifier);

    tracing::debug!(redirect_uri = %oauth.redirect_uri, "Redirecting to TIDAL authorization");
    Ok((cookies, Redirect::temporary(&url)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters TIDAL appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Reasons a callback is turned away. Each maps to a `/?error=` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFailure {
    ProviderDenied,
    InvalidState,
    NoCode,
    ServerConfig,
    MissingCodeVerifier,
    TokenExchangeFailed,
    UserInfoFailed,
    CallbackError,
}

impl CallbackFailure {
    pub fn flag(&self) -> &'static str {
        match self {
            CallbackFailure::ProviderDenied => "tidal_auth_failed",
            CallbackFailure::InvalidState => "invalid_state",
            CallbackFailure::NoCode => "no_code",
            CallbackFailure::ServerConfig => "server_config",
            CallbackFailure::MissingCodeVerifier => "missing_code_verifier",
            CallbackFailure::TokenExchangeFailed => "token_exchange_failed",
            CallbackFailure::UserInfoFailed => "user_info_failed",
            CallbackFailure::CallbackError => "callback_error",
        }
    }

    pub fn location(&self) -> String {
        format!("/?error={}", self.flag())
    }
}

impl IntoResponse for CallbackFailure {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.location()).into_response()
    }
}

/// GET /api/tidal/callback - Finish the authorization-code flow.
///
/// Never returns an error body: every outcome is a redirect back to the UI.
pub async fn callback_handler(
    State(state): State<AppState>,
    session: ClientSession,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable callback query");
            CallbackParams::default()
        }
    };

    match complete_login(&state, &session, params).await {
        Ok(cookies) => (cookies, Redirect::temporary(SUCCESS_LOCATION)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn complete_login(
    state: &AppState,
    session: &ClientSession,
    params: CallbackParams,
) -> std::result::Result<SessionCookies, CallbackFailure> {
    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        tracing::warn!(error, "TIDAL authorization denied");
        return Err(CallbackFailure::ProviderDenied);
    }

    match (params.state.as_deref(), session.state()) {
        (Some(returned), Some(stored)) if states_match(returned, stored) => {}
        _ => {
            tracing::warn!("Callback state missing or mismatched");
            return Err(CallbackFailure::InvalidState);
        }
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(CallbackFailure::NoCode)?;

    if state.tokens.config().credentials().is_err() {
        tracing::error!("TIDAL client id or secret not configured");
        return Err(CallbackFailure::ServerConfig);
    }

    let verifier = session.code_verifier().ok_or_else(|| {
        tracing::warn!("Callback without code verifier cookie");
        CallbackFailure::MissingCodeVerifier
    })?;

    let tokens = state
        .tokens
        .exchange_code(code, verifier)
        .await
        .map_err(|e| match e {
            OAuthError::Rejected { status, body } => {
                tracing::error!(status, body = %body, "Token exchange failed");
                CallbackFailure::TokenExchangeFailed
            }
            OAuthError::Config(msg) => {
                tracing::error!(error = %msg, "Token exchange misconfigured");
                CallbackFailure::ServerConfig
            }
            other => {
                tracing::error!(error = %other, "Token exchange error");
                CallbackFailure::CallbackError
            }
        })?;

    let user = state
        .tidal
        .current_user(&tokens.access_token)
        .await
        .map_err(|e| match e {
            TidalError::Status { status, body } => {
                tracing::error!(status = %status.as_u16(), body = %body, "User info fetch failed");
                CallbackFailure::UserInfoFailed
            }
            other => {
                tracing::error!(error = %other, "User info fetch error");
                CallbackFailure::CallbackError
            }
        })?;

    tracing::info!(user_id = %user.id, "TIDAL account connected");

    let mut cookies = state.session_cookies();
    cookies
        .set_tokens(&tokens)
        .set_account_id(&user.id.to_string())
        .clear_pkce();
    Ok(cookies)
}

/// Compare state tokens without leaking where they differ.
fn states_match(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    a_bytes.ct_eq(b_bytes).into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh / logout
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/tidal/token - Refresh the access token from the refresh cookie.
pub async fn token_handler(
    State(state): State<AppState>,
    session: ClientSession,
) -> Result<(SessionCookies, Json<SuccessResponse>)> {
    let refresh = session
        .refresh_token()
        .ok_or_else(|| ServerError::Unauthorized("No refresh token available".to_string()))?;

    let refreshed = refresh_session(&state, refresh).await?;
    Ok((refreshed.cookies, SuccessResponse::ok()))
}

/// POST /api/tidal/logout - Drop the token and account cookies.
pub async fn logout_handler(State(state): State<AppState>) -> (SessionCookies, Json<SuccessResponse>) {
    let mut cookies = state.session_cookies();
    cookies.clear_tokens();
    (cookies, SuccessResponse::ok())
}
