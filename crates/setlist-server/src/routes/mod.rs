//! API routes.

pub mod auth;
pub mod chat;
pub mod health;
pub mod tidal;

pub use auth::{
    CallbackFailure, CallbackParams, SUCCESS_LOCATION, SuccessResponse, callback_handler,
    login_handler, logout_handler, token_handler,
};
pub use chat::{ChatRequest, ChatResponse, GenerateResponse, chat_handler, generate_handler};
pub use health::{HealthResponse, health_routes};
pub use tidal::{
    AddTracksRequest, CreatePlaylistRequest, PageParams, SearchParams, add_tracks_handler,
    create_playlist_handler, list_playlists_handler, playlist_tracks_handler, search_handler,
    user_handler,
};
