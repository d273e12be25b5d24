//! Playlist generation through an OpenAI-compatible chat-completion API.
//!
//! - [`prompt`]: turns wizard parameters into a prompt
//! - [`playlist`]: normalizes the model's reply and parses songs
//! - [`client`]: the HTTP client and the [`PlaylistGenerator`] seam

pub mod client;
pub mod error;
pub mod playlist;
pub mod prompt;

pub use client::{CompletionClient, CompletionConfig, PlaylistGenerator, SharedGenerator};
pub use error::{LlmError, Result};
pub use playlist::{GeneratedPlaylist, Song, format_playlist, parse_song, parse_songs};
pub use prompt::{DateRange, PlaylistParams, SYSTEM_PROMPT};
