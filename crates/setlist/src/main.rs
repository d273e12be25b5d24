//! setlist - AI playlist generation with TIDAL export.
//!
//! Main entry point for the setlist CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use setlist_config::LoggingSection;

mod commands;

use commands::{generate, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// setlist - AI playlist generation with TIDAL export
#[derive(Parser)]
#[command(name = "setlist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of discovery
    #[arg(short, long, global = true, env = "SETLIST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start(start::StartArgs),

    /// Generate a playlist once and print it
    Generate(generate::GenerateArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = setlist_config::load_config(cli.config.as_deref())?;
    let _guard = init_tracing(&loaded.config.logging, cli.verbose);

    let ctx = commands::Context {
        config: loaded.config,
        loaded_from: loaded
            .sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.clone())
            .collect(),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Generate(args) => generate::run(args, &ctx).await,
    }
}

/// Console layer filtered by `RUST_LOG` (or the configured level), plus a
/// daily-rotated JSON file layer when `logging.json_dir` is set.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(
    logging: &LoggingSection,
    verbose: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let console_filter = if verbose {
        EnvFilter::new(
            "setlist=debug,setlist_server=debug,setlist_oauth=debug,setlist_llm=debug,setlist_config=debug,tower_http=debug,info",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let (file_layer, guard) = match &logging.json_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "setlist.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "setlist=trace,setlist_server=trace,setlist_oauth=trace,setlist_llm=trace,setlist_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}
