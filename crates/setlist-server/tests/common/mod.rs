//! Common test utilities for integration tests.
//!
//! The router is driven in-process with `oneshot`; TIDAL's auth server, its
//! REST API and the completion provider are each a wiremock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use setlist_llm::{CompletionClient, CompletionConfig};
use setlist_oauth::{OAuthConfig, TokenClient};
use setlist_server::{AppState, Server, ServerConfig, TidalApi};
use tower::ServiceExt;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
/// `Basic base64("client-id:client-secret")`
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";
pub const API_KEY: &str = "pplx-test";

/// A router wired to mock upstreams.
pub struct TestApp {
    pub auth: MockServer,
    pub tidal: MockServer,
    pub completion: MockServer,
    router: Router,
}

impl TestApp {
    /// Client credentials and API key configured.
    pub async fn start() -> Result<Self> {
        Self::start_with(true).await
    }

    /// No client credentials and no API key.
    pub async fn start_unconfigured() -> Result<Self> {
        Self::start_with(false).await
    }

    async fn start_with(configured: bool) -> Result<Self> {
        let auth = MockServer::start().await;
        let tidal = MockServer::start().await;
        let completion = MockServer::start().await;

        let timeout = Duration::from_secs(5);
        let mut oauth = OAuthConfig::tidal(&auth.uri()).with_timeout(timeout);
        let mut llm = CompletionConfig::default()
            .with_base_url(completion.uri())
            .with_timeout(timeout);
        if configured {
            oauth = oauth
                .with_client_id(CLIENT_ID)
                .with_client_secret(CLIENT_SECRET);
            llm = llm.with_api_key(API_KEY);
        }

        let state = AppState::new(
            ServerConfig::new().with_request_logging(false),
            TokenClient::new(oauth)?,
            TidalApi::new(tidal.uri(), timeout)?,
            Arc::new(CompletionClient::new(llm)?),
        );
        let router = Server::new(state).router();

        Ok(Self {
            auth,
            tidal,
            completion,
            router,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, uri: &str, cookies: &str) -> Result<TestResponse> {
        self.send(request("GET", uri, cookies, Body::empty())?).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        cookies: &str,
        json: serde_json::Value,
    ) -> Result<TestResponse> {
        let mut req = request("POST", uri, cookies, Body::from(serde_json::to_vec(&json)?))?;
        req.headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse()?);
        self.send(req).await
    }
}

fn request(method: &str, uri: &str, cookies: &str, body: Body) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    Ok(builder.body(body)?)
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Raw `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// The `Set-Cookie` header for `name`, if any.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies().into_iter().find(|c| c.starts_with(&prefix))
    }

    /// Value of the cookie `name` as set by this response.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let header = self.set_cookie(name)?;
        let pair = header.split(';').next()?;
        pair.split_once('=').map(|(_, v)| v.to_string())
    }
}

/// Value of query parameter `key` in `url`.
pub fn query_value(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| urlencoding::decode(v).map(|v| v.into_owned()).ok())?
    })
}
