//! Authenticated calls to TIDAL with a single refresh-and-retry.

use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use setlist_oauth::OAuthError;

use crate::error::{Result, ServerError};
use crate::session::{ClientSession, SessionCookies};
use crate::state::AppState;
use crate::tidal::TidalError;

/// Outcome of a successful token refresh.
#[derive(Debug)]
pub struct Refreshed {
    pub access_token: String,
    /// Rotated access (and maybe refresh) cookies.
    pub cookies: SessionCookies,
}

/// Upstream value plus any cookies rotated while obtaining it.
#[derive(Debug)]
pub struct Forwarded<T> {
    pub value: T,
    pub cookies: SessionCookies,
}

/// A forwarded call that failed, with any cookies rotated before it failed.
///
/// A refresh that succeeded may have invalidated the old refresh token, so its
/// cookies are written even when the call itself fails.
#[derive(Debug)]
pub struct ForwardError {
    pub error: ServerError,
    pub cookies: SessionCookies,
}

impl From<ServerError> for ForwardError {
    fn from(error: ServerError) -> Self {
        Self {
            error,
            cookies: SessionCookies::default(),
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        (self.cookies, self.error).into_response()
    }
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_session(state: &AppState, refresh_token: &str) -> Result<Refreshed> {
    let tokens = state.tokens.refresh(refresh_token).await.map_err(|e| match e {
        OAuthError::Config(msg) => ServerError::Config(msg),
        OAuthError::Rejected { status, body } => {
            tracing::warn!(status, body = %body, "Token refresh rejected");
            ServerError::Unauthorized("Token refresh failed".to_string())
        }
        other => {
            tracing::error!(error = %other, "Token refresh failed");
            ServerError::Internal("Internal server error".to_string())
        }
    })?;

    tracing::debug!(rotated = tokens.refresh_token.is_some(), "Access token refreshed");

    let mut cookies = state.session_cookies();
    cookies.set_tokens(&tokens);
    Ok(Refreshed {
        access_token: tokens.access_token,
        cookies,
    })
}

/// Run `call` with the session's access token.
///
/// Without an access token but with a refresh token, the refresh happens up
/// front. If TIDAL answers 401 and no refresh has happened yet, the session is
/// refreshed once and `call` retried once. `failure` is the message surfaced
/// for any other upstream status. Rotated cookies ride along on both outcomes.
pub async fn forward<T, F, Fut>(
    state: &AppState,
    session: &ClientSession,
    failure: &'static str,
    call: F,
) -> std::result::Result<Forwarded<T>, ForwardError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = std::result::Result<T, TidalError>>,
{
    let mut cookies = state.session_cookies();
    let mut refreshed = false;

    let token = match (session.access_token(), session.refresh_token()) {
        (Some(token), _) => token.to_string(),
        (None, Some(refresh)) => {
            let r = refresh_session(state, refresh).await?;
            cookies.absorb(r.cookies);
            refreshed = true;
            r.access_token
        }
        (None, None) => {
            return Err(ServerError::Unauthorized("Not authenticated".to_string()).into());
        }
    };

    let err = match call(token).await {
        Ok(value) => return Ok(Forwarded { value, cookies }),
        Err(e) => e,
    };

    let refresh = match session.refresh_token() {
        Some(refresh) if err.is_unauthorized() && !refreshed => refresh,
        _ => {
            return Err(ForwardError {
                error: upstream_error(err, failure),
                cookies,
            });
        }
    };

    tracing::debug!("Access token rejected, refreshing and retrying once");
    let r = refresh_session(state, refresh).await?;
    cookies.absorb(r.cookies);

    match call(r.access_token).await {
        Ok(value) => Ok(Forwarded { value, cookies }),
        Err(e) => Err(ForwardError {
            error: upstream_error(e, failure),
            cookies,
        }),
    }
}

/// Map a TIDAL failure to a client-facing error. Upstream bodies are logged, not returned.
pub fn upstream_error(err: TidalError, failure: &'static str) -> ServerError {
    match err {
        TidalError::Status { status, body } => {
            tracing::warn!(status = %status.as_u16(), body = %body, "{}", failure);
            ServerError::Upstream {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message: failure.to_string(),
            }
        }
        other => {
            tracing::error!(error = %other, "{}", failure);
            ServerError::Internal("Internal server error".to_string())
        }
    }
}
