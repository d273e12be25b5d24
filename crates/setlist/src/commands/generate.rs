//! Generate command - one-shot playlist generation.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use setlist_llm::{CompletionClient, CompletionConfig, PlaylistGenerator, PlaylistParams};

use super::Context;

/// Arguments for the generate command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Genre to include (repeatable)
    #[arg(short, long = "genre", required = true)]
    pub genres: Vec<String>,

    /// Earliest release year
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Latest release year
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Mood, e.g. "melancholic"
    #[arg(long)]
    pub mood: Option<String>,

    /// Tempo, e.g. "slow"
    #[arg(long)]
    pub tempo: Option<String>,

    /// Free-text preferences
    #[arg(short, long)]
    pub description: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    fn params(&self) -> PlaylistParams {
        let mut params = PlaylistParams::new(self.genres.iter().cloned());
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            params = params.with_date_range(from, to);
        }
        if let Some(mood) = &self.mood {
            params = params.with_mood(mood);
        }
        if let Some(tempo) = &self.tempo {
            params = params.with_tempo(tempo);
        }
        if let Some(description) = &self.description {
            params = params.with_description(description);
        }
        params
    }
}

/// Run the generate command.
pub async fn run(args: GenerateArgs, ctx: &Context) -> Result<()> {
    let prompt = args.params().build_prompt()?;

    let section = &ctx.config.completion;
    let client = CompletionClient::new(CompletionConfig {
        api_key: section.api_key.clone(),
        base_url: section.base_url.clone(),
        model: section.model.clone(),
        temperature: section.temperature,
        max_tokens: section.max_tokens,
        timeout: Duration::from_secs(section.timeout_secs),
    })?;

    tracing::debug!(prompt = %prompt, model = %section.model, "Generating playlist");

    let generated = client.generate(&prompt).await?;

    if args.json {
        let out = serde_json::json!({
            "prompt": prompt,
            "playlist": generated.playlist,
            "songs": generated.songs,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", generated.playlist);
    }
    Ok(())
}
