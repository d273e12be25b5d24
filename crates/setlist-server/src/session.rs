//! Client-held session.
//!
//! All per-user state lives in HTTP-only cookies. [`ClientSession`] reads
//! them off the inbound request; [`SessionCookies`] collects the `Set-Cookie`
//! headers a handler wants to emit.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, header, request::Parts};
use axum::response::{IntoResponseParts, ResponseParts};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use setlist_oauth::OAuthTokens;

/// Anti-CSRF state cookie.
pub const STATE_COOKIE: &str = "tidal_state";
/// PKCE code verifier cookie.
pub const VERIFIER_COOKIE: &str = "tidal_code_verifier";
/// Bearer access token cookie.
pub const ACCESS_TOKEN_COOKIE: &str = "tidal_access_token";
/// Refresh token cookie.
pub const REFRESH_TOKEN_COOKIE: &str = "tidal_refresh_token";
/// Account id cookie.
pub const USER_ID_COOKIE: &str = "tidal_user_id";

/// Lifetime of the state and verifier cookies.
pub const PKCE_MAX_AGE_SECS: i64 = 600;
/// Lifetime of the refresh token and account id cookies (30 days).
pub const LONG_LIVED_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Cookies sent by the browser.
#[derive(Clone, Default)]
pub struct ClientSession {
    cookies: HashMap<String, String>,
}

impl ClientSession {
    /// Parse every `Cookie` header. Malformed pairs are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for cookie in Cookie::split_parse(raw).flatten() {
                cookies.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        Self { cookies }
    }

    /// Non-empty cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn state(&self) -> Option<&str> {
        self.get(STATE_COOKIE)
    }

    pub fn code_verifier(&self) -> Option<&str> {
        self.get(VERIFIER_COOKIE)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.get(ACCESS_TOKEN_COOKIE)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.get(REFRESH_TOKEN_COOKIE)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID_COOKIE)
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.cookies.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ClientSession").field("cookies", &names).finish()
    }
}

impl<S> FromRequestParts<S> for ClientSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Attributes shared by every session cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Mark cookies `Secure`.
    pub secure: bool,
}

impl CookiePolicy {
    fn build(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::seconds(max_age_secs))
            .build()
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), 0);
        cookie.make_removal();
        cookie
    }
}

/// `Set-Cookie` headers to attach to a response.
#[derive(Clone, Default)]
pub struct SessionCookies {
    policy: CookiePolicy,
    cookies: Vec<Cookie<'static>>,
}

impl SessionCookies {
    pub fn new(policy: CookiePolicy) -> Self {
        Self {
            policy,
            cookies: Vec::new(),
        }
    }

    /// Store the state and verifier for one login attempt.
    pub fn set_pkce(&mut self, state: &str, verifier: &str) -> &mut Self {
        self.push(STATE_COOKIE, state, PKCE_MAX_AGE_SECS);
        self.push(VERIFIER_COOKIE, verifier, PKCE_MAX_AGE_SECS);
        self
    }

    /// Store an access token and, if issued, its refresh token.
    pub fn set_tokens(&mut self, tokens: &OAuthTokens) -> &mut Self {
        let max_age = i64::try_from(tokens.expires_in_or_default()).unwrap_or(i64::MAX);
        self.push(ACCESS_TOKEN_COOKIE, &tokens.access_token, max_age);
        if let Some(refresh) = tokens.refresh_token.as_deref().filter(|r| !r.is_empty()) {
            self.push(REFRESH_TOKEN_COOKIE, refresh, LONG_LIVED_MAX_AGE_SECS);
        }
        self
    }

    pub fn set_account_id(&mut self, id: &str) -> &mut Self {
        self.push(USER_ID_COOKIE, id, LONG_LIVED_MAX_AGE_SECS);
        self
    }

    /// Delete the state and verifier cookies.
    pub fn clear_pkce(&mut self) -> &mut Self {
        self.remove(STATE_COOKIE);
        self.remove(VERIFIER_COOKIE);
        self
    }

    /// Delete the token and account id cookies.
    pub fn clear_tokens(&mut self) -> &mut Self {
        self.remove(ACCESS_TOKEN_COOKIE);
        self.remove(REFRESH_TOKEN_COOKIE);
        self.remove(USER_ID_COOKIE);
        self
    }

    /// Append another set of cookies, keeping this set's policy.
    pub fn absorb(&mut self, other: SessionCookies) -> &mut Self {
        self.cookies.extend(other.cookies);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Cookies queued so far.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    fn push(&mut self, name: &'static str, value: &str, max_age_secs: i64) {
        let cookie = self.policy.build(name, value.to_string(), max_age_secs);
        self.cookies.push(cookie);
    }

    fn remove(&mut self, name: &'static str) {
        let cookie = self.policy.removal(name);
        self.cookies.push(cookie);
    }
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|c| c.name()).collect();
        f.debug_struct("SessionCookies")
            .field("policy", &self.policy)
            .field("cookies", &names)
            .finish()
    }
}

impl IntoResponseParts for SessionCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = cookie.name(), error = %e, "Dropping unencodable cookie");
                }
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    fn tokens(refresh: Option<&str>, expires_in: Option<u64>) -> OAuthTokens {
        OAuthTokens {
            access_token: "at".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in,
            token_type: Some("Bearer".to_string()),
            scope: None,
        }
    }

    fn set_cookie_headers(cookies: SessionCookies) -> Vec<String> {
        let response = (cookies, "ok").into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("tidal_state=abc; tidal_code_verifier=v1"),
        );
        headers.append(header::COOKIE, HeaderValue::from_static("tidal_user_id=42"));

        let session = ClientSession::from_headers(&headers);
        assert_eq!(session.state(), Some("abc"));
        assert_eq!(session.code_verifier(), Some("v1"));
        assert_eq!(session.user_id(), Some("42"));
        assert_eq!(session.access_token(), None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("tidal_access_token="));
        assert_eq!(ClientSession::from_headers(&headers).access_token(), None);
    }

    #[test]
    fn test_pkce_cookie_attributes() {
        let mut cookies = SessionCookies::new(CookiePolicy { secure: true });
        cookies.set_pkce("st", "ver");

        let headers = set_cookie_headers(cookies);
        assert_eq!(headers.len(), 2);
        for h in &headers {
            assert!(h.contains("HttpOnly"));
            assert!(h.contains("Secure"));
            assert!(h.contains("SameSite=Lax"));
            assert!(h.contains("Path=/"));
            assert!(h.contains("Max-Age=600"));
        }
        assert!(headers[0].starts_with("tidal_state=st"));
    }

    #[test]
    fn test_insecure_in_development() {
        let mut cookies = SessionCookies::new(CookiePolicy::default());
        cookies.set_account_id("1");
        let headers = set_cookie_headers(cookies);
        assert!(!headers[0].contains("Secure"));
        assert!(headers[0].contains("Max-Age=2592000"));
    }

    #[test]
    fn test_token_cookies() {
        let mut cookies = SessionCookies::default();
        cookies.set_tokens(&tokens(Some("rt"), Some(1800)));
        let headers = set_cookie_headers(cookies);
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("tidal_access_token=at"));
        assert!(headers[0].contains("Max-Age=1800"));
        assert!(headers[1].starts_with("tidal_refresh_token=rt"));
        assert!(headers[1].contains("Max-Age=2592000"));
    }

    #[test]
    fn test_no_refresh_cookie_without_refresh_token() {
        let mut cookies = SessionCookies::default();
        cookies.set_tokens(&tokens(None, None));
        let headers = set_cookie_headers(cookies);
        assert_eq!(headers.len(), 1);
        assert!(headers[0].contains("Max-Age=3600"));
    }

    #[test]
    fn test_removal_cookies() {
        let mut cookies = SessionCookies::default();
        cookies.clear_pkce().clear_tokens();
        let headers = set_cookie_headers(cookies);
        assert_eq!(headers.len(), 5);
        for h in &headers {
            assert!(h.contains("Max-Age=0"));
            assert!(h.contains("Path=/"));
        }
    }

    #[test]
    fn test_debug_hides_values() {
        let mut cookies = SessionCookies::default();
        cookies.set_pkce("secret-state", "secret-verifier");
        let debug = format!("{:?}", cookies);
        assert!(debug.contains("tidal_state"));
        assert!(!debug.contains("secret-state"));
    }
}
