//! Normalization of model output into a playlist.

use serde::{Deserialize, Serialize};

/// One parsed `Artist - Title (Year)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub artist: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl Song {
    /// Query string suitable for a track search.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

/// Normalized playlist text plus whatever songs could be parsed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlaylist {
    pub playlist: String,
    pub songs: Vec<Song>,
}

impl GeneratedPlaylist {
    /// Normalize raw completion content.
    pub fn from_content(content: &str) -> Self {
        let playlist = format_playlist(content);
        let songs = parse_songs(&playlist);
        Self { playlist, songs }
    }
}

/// Drop blank lines and leading `N.` numbering, one entry per line.
pub fn format_playlist(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_numbering)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse every line that looks like a song, skipping the rest.
pub fn parse_songs(playlist: &str) -> Vec<Song> {
    playlist.lines().filter_map(parse_song).collect()
}

/// Parse `Artist - Title (Year)`. The year is optional.
pub fn parse_song(line: &str) -> Option<Song> {
    let line = strip_numbering(line.trim());
    let line = line.trim_matches('"').trim();

    let (rest, year) = split_year(line);
    let (artist, title) = rest
        .split_once(" - ")
        .or_else(|| rest.split_once(" – "))?;

    let artist = artist.trim();
    let title = title.trim().trim_matches('"').trim();
    if artist.is_empty() || title.is_empty() {
        return None;
    }

    Some(Song {
        artist: artist.to_string(),
        title: title.to_string(),
        year,
    })
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Split a trailing `(YYYY)` off the line.
fn split_year(line: &str) -> (&str, Option<u16>) {
    let Some(body) = line.strip_suffix(')') else {
        return (line, None);
    };
    let Some(open) = body.rfind('(') else {
        return (line, None);
    };
    let inner = body[open + 1..].trim();
    if inner.len() == 4 && inner.chars().all(|c| c.is_ascii_digit()) {
        (body[..open].trim_end(), inner.parse().ok())
    } else {
        (line, None)
    }
}
