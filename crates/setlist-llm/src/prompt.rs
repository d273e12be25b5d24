//! Prompt construction from playlist wizard parameters.

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

/// System instruction sent with every playlist request.
pub const SYSTEM_PROMPT: &str = "You are a music playlist generator. You have eclectic taste in music. \
Create a playlist based on the user's request.
Format the response as a numbered list of songs, with each entry in the format:
\"Artist - Song Title (Year)\"
Include 10-15 songs that match the user's criteria.
Do not include any additional text or explanations.
Make sure to include a good mix of popular and lesser-known songs that fit the criteria.
Ensure the years match the requested date range.";

/// Inclusive range of release dates, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Everything the wizard collects before generating a playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistParams {
    pub genres: Vec<String>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub tempo: Option<String>,
    #[serde(default, alias = "description")]
    pub custom_description: Option<String>,
}

impl PlaylistParams {
    /// Create params for the given genres.
    pub fn new<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            genres: genres.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.date_range = Some(DateRange {
            start: start.into(),
            end: end.into(),
        });
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_tempo(mut self, tempo: impl Into<String>) -> Self {
        self.tempo = Some(tempo.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.custom_description = Some(description.into());
        self
    }

    /// Reject params that can't produce a meaningful prompt.
    pub fn validate(&self) -> Result<()> {
        if self.genres.iter().all(|g| g.trim().is_empty()) {
            return Err(LlmError::InvalidRequest(
                "At least one genre is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the user prompt. Optional parts are only included when non-blank.
    pub fn build_prompt(&self) -> Result<String> {
        self.validate()?;

        let genres: Vec<&str> = self
            .genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();

        let mut prompt = format!(
            "Create a playlist with songs from the following genres: {}. ",
            genres.join(", ")
        );

        if let Some(range) = &self.date_range {
            prompt.push_str(&format!(
                "Include songs from {} to {}. ",
                range.start.trim(),
                range.end.trim()
            ));
        }
        if let Some(mood) = non_blank(&self.mood) {
            prompt.push_str(&format!("The mood should be {}. ", mood));
        }
        if let Some(tempo) = non_blank(&self.tempo) {
            prompt.push_str(&format!("The tempo should be {}. ", tempo));
        }
        if let Some(description) = non_blank(&self.custom_description) {
            prompt.push_str(&format!("Additional preferences: {}", description));
        }

        Ok(prompt.trim_end().to_string())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
