//! Authenticated TIDAL passthrough endpoints.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ServerError};
use crate::forward::{ForwardError, forward};
use crate::session::{ClientSession, SessionCookies};
use crate::state::AppState;
use crate::tidal::{TidalId, TidalUser};

/// Passthrough response: upstream JSON or an error, plus rotated cookies.
type Passthrough<T> = std::result::Result<(SessionCookies, Json<T>), ForwardError>;

const DEFAULT_PLAYLIST_LIMIT: u32 = 50;
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const DEFAULT_TRACK_LIMIT: u32 = 100;

/// `limit`/`offset` paging parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Query parameters for track search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub limit: Option<u32>,
}

/// Body of `POST /api/tidal/playlists`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /api/tidal/playlists/{id}/tracks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTracksRequest {
    #[serde(default)]
    pub track_ids: Vec<TidalId>,
}

fn query<T>(q: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    q.map(|Query(t)| t)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn body<T>(b: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    b.map(|Json(t)| t)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn account_id(session: &ClientSession) -> Result<String> {
    session
        .user_id()
        .map(str::to_string)
        .ok_or_else(|| ServerError::Unauthorized("Not authenticated".to_string()))
}

/// GET /api/tidal/user - Current account profile.
pub async fn user_handler(
    State(state): State<AppState>,
    session: ClientSession,
) -> Passthrough<TidalUser> {
    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to fetch user info", |token| {
        let api = api.clone();
        async move { api.current_user(&token).await }
    })
    .await?;
    Ok((out.cookies, Json(out.value)))
}

/// GET /api/tidal/playlists - The account's playlists.
pub async fn list_playlists_handler(
    State(state): State<AppState>,
    session: ClientSession,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> Passthrough<Value> {
    let params = query(params)?;
    let user_id = account_id(&session)?;
    let limit = params.limit.unwrap_or(DEFAULT_PLAYLIST_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to fetch playlists", |token| {
        let api = api.clone();
        let user_id = user_id.clone();
        async move { api.user_playlists(&token, &user_id, limit, offset).await }
    })
    .await?;
    Ok((out.cookies, Json(out.value)))
}

/// POST /api/tidal/playlists - Create a playlist.
pub async fn create_playlist_handler(
    State(state): State<AppState>,
    session: ClientSession,
    request: std::result::Result<Json<CreatePlaylistRequest>, JsonRejection>,
) -> Passthrough<Value> {
    let user_id = account_id(&session)?;
    let request = body(request)?;
    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Title is required".to_string()))?;
    let description = request.description.unwrap_or_default();

    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to create playlist", |token| {
        let api = api.clone();
        let user_id = user_id.clone();
        let title = title.clone();
        let description = description.clone();
        async move {
            api.create_playlist(&token, &user_id, &title, &description)
                .await
        }
    })
    .await?;

    tracing::info!(title = %title, "Playlist created");
    Ok((out.cookies, Json(out.value)))
}

/// GET /api/tidal/search - Track search.
pub async fn search_handler(
    State(state): State<AppState>,
    session: ClientSession,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Passthrough<Value> {
    let params = query(params)?;
    let search = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Query parameter is required".to_string()))?;
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to search tracks", |token| {
        let api = api.clone();
        let search = search.clone();
        async move { api.search_tracks(&token, &search, limit).await }
    })
    .await?;
    Ok((out.cookies, Json(out.value)))
}

/// GET /api/tidal/playlists/{id}/tracks - Tracks in a playlist.
pub async fn playlist_tracks_handler(
    State(state): State<AppState>,
    session: ClientSession,
    Path(playlist_id): Path<String>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> Passthrough<Value> {
    let params = query(params)?;
    let limit = params.limit.unwrap_or(DEFAULT_TRACK_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to fetch playlist tracks", |token| {
        let api = api.clone();
        let playlist_id = playlist_id.clone();
        async move { api.playlist_tracks(&token, &playlist_id, limit, offset).await }
    })
    .await?;
    Ok((out.cookies, Json(out.value)))
}

/// POST /api/tidal/playlists/{id}/tracks - Append tracks to a playlist.
pub async fn add_tracks_handler(
    State(state): State<AppState>,
    session: ClientSession,
    Path(playlist_id): Path<String>,
    request: std::result::Result<Json<AddTracksRequest>, JsonRejection>,
) -> Passthrough<Value> {
    let request = body(request)?;
    if request.track_ids.is_empty() {
        return Err(ServerError::BadRequest("trackIds must not be empty".to_string()).into());
    }
    let track_ids: Vec<String> = request.track_ids.iter().map(ToString::to_string).collect();

    let api = state.tidal.clone();
    let out = forward(&state, &session, "Failed to add tracks to playlist", |token| {
        let api = api.clone();
        let playlist_id = playlist_id.clone();
        let track_ids = track_ids.clone();
        async move { api.add_tracks(&token, &playlist_id, &track_ids).await }
    })
    .await?;

    tracing::info!(playlist_id = %playlist_id, count = track_ids.len(), "Tracks added");
    Ok((out.cookies, Json(out.value)))
}
