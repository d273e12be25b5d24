//! Start command - launches the setlist server.

use anyhow::Result;
use clap::Args;
use setlist_server::Server;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    if ctx.verbose {
        if ctx.loaded_from.is_empty() {
            println!("No config files found, using defaults + environment");
        }
        for path in &ctx.loaded_from {
            println!("Loaded config: {}", path.display());
        }
        println!("Environment: {:?}", config.server.environment);
        println!("Completion model: {}", config.completion.model);
    }

    let server = Server::from_config(&config)?;
    println!("Listening on http://{}", server.bind_address());
    server.run().await?;
    Ok(())
}
