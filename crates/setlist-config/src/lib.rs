//! Configuration system for the setlist service.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[tidal]`, `[completion]` and `[logging]` sections
//! - Config file layering (XDG user config + project-local overrides)
//! - Environment overrides for credentials (`TIDAL_CLIENT_ID`, `PERPLEXITY_API_KEY`, ...)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_layers, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
