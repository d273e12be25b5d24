//! Client for the TIDAL REST API.
//!
//! Every call takes the bearer token explicitly; the caller owns refresh.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default REST API base URL.
pub const TIDAL_API_BASE: &str = "https://api.tidal.com/v1";

/// Content type TIDAL expects on every request.
pub const TIDAL_CONTENT_TYPE: &str = "application/vnd.tidal.v1+json";

/// Errors from the TIDAL API.
#[derive(Debug, Error)]
pub enum TidalError {
    /// Non-success status. The body is kept for logging only.
    #[error("TIDAL API returned {status}")]
    Status { status: StatusCode, body: String },

    #[error("TIDAL request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode TIDAL response: {0}")]
    Decode(String),
}

impl TidalError {
    /// The upstream rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TidalError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

pub type Result<T> = std::result::Result<T, TidalError>;

/// Account or track id as TIDAL returns it (usually numeric).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TidalId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for TidalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TidalId::Number(n) => write!(f, "{}", n),
            TidalId::Text(s) => f.write_str(s),
        }
    }
}

/// Profile from `/users/me`. Unknown fields are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidalUser {
    pub id: TidalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct NewPlaylist<'a> {
    title: &'a str,
    description: &'a str,
    picture: Option<()>,
}

/// TIDAL REST client.
#[derive(Debug, Clone)]
pub struct TidalApi {
    client: Client,
    base_url: String,
}

impl TidalApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /users/me`
    pub async fn current_user(&self, token: &str) -> Result<TidalUser> {
        let req = self.request(Method::GET, self.url("/users/me"), token);
        self.send_json(req).await
    }

    /// `GET /users/{id}/playlists`
    pub async fn user_playlists(
        &self,
        token: &str,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value> {
        let url = self.url(&format!("/users/{}/playlists", urlencoding::encode(user_id)));
        let req = self
            .request(Method::GET, url, token)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(req).await
    }

    /// `POST /users/{id}/playlists`
    pub async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Value> {
        let url = self.url(&format!("/users/{}/playlists", urlencoding::encode(user_id)));
        let body = serde_json::to_vec(&NewPlaylist {
            title,
            description,
            picture: None,
        })
        .map_err(|e| TidalError::Decode(e.to_string()))?;
        let req = self.request(Method::POST, url, token).body(body);
        self.send_json(req).await
    }

    /// `GET /search?type=TRACKS`
    pub async fn search_tracks(&self, token: &str, query: &str, limit: u32) -> Result<Value> {
        let limit = limit.to_string();
        let req = self.request(Method::GET, self.url("/search"), token).query(&[
            ("query", query),
            ("limit", limit.as_str()),
            ("type", "TRACKS"),
        ]);
        self.send_json(req).await
    }

    /// `GET /playlists/{id}/tracks`
    pub async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value> {
        let url = self.url(&format!("/playlists/{}/tracks", urlencoding::encode(playlist_id)));
        let req = self
            .request(Method::GET, url, token)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(req).await
    }

    /// Append tracks to a playlist.
    ///
    /// TIDAL guards playlist writes with the playlist's current ETag, so the
    /// playlist is fetched first.
    pub async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<Value> {
        let playlist_url = self.url(&format!("/playlists/{}", urlencoding::encode(playlist_id)));
        let response = send(self.request(Method::GET, playlist_url.clone(), token)).await?;
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let form = [
            ("trackIds", track_ids.join(",")),
            ("onArtifactNotFound", "FAIL".to_string()),
        ];
        // Form-encoded, so no vendor content type here.
        let mut req = self
            .client
            .post(format!("{}/items", playlist_url))
            .bearer_auth(token)
            .form(&form);
        if let Some(etag) = etag {
            req = req.header(header::IF_NONE_MATCH, etag);
        }

        let response = send(req).await?;
        decode_or_empty(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: String, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, TIDAL_CONTENT_TYPE)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = send(req).await?;
        response
            .json()
            .await
            .map_err(|e| TidalError::Decode(e.to_string()))
    }
}

async fn send(req: RequestBuilder) -> Result<Response> {
    let response = req.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TidalError::Status { status, body });
    }
    Ok(response)
}

/// Some write endpoints answer with an empty body.
async fn decode_or_empty(response: Response) -> Result<Value> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&bytes).map_err(|e| TidalError::Decode(e.to_string()))
}
