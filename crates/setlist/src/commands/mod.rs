//! CLI command implementations.

pub mod generate;
pub mod start;

use std::path::PathBuf;

use setlist_config::SetlistConfig;

/// Shared context for all commands.
pub struct Context {
    /// Merged configuration (files + environment).
    pub config: SetlistConfig,
    /// Config files that were actually loaded.
    pub loaded_from: Vec<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}
