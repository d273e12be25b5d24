//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/setlist/config.toml` (XDG user config, or `$SETLIST_CONFIG_DIR`)
//! 2. `./setlist.toml` (project-local)
//! 3. Environment variables
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use toml::Table;

use crate::{ConfigError, Result, SetlistConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "setlist.toml";

/// Default config filename within the XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "setlist";

/// Environment variable overriding the user config directory.
const CONFIG_DIR_ENV: &str = "SETLIST_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: SetlistConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration.
///
/// With `explicit = Some(path)` only that file is read (and must exist).
/// Otherwise the user and project-local layers are discovered and merged.
/// Environment overrides are applied last in both cases.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let layers = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::ReadFile {
                    path: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            vec![path.to_path_buf()]
        }
        None => xdg_config_path()
            .into_iter()
            .chain(std::iter::once(PathBuf::from(PROJECT_CONFIG_FILE)))
            .collect(),
    };

    load_layers(&layers, |key| std::env::var(key).ok())
}

/// Merge the given files in order (missing ones are skipped), then apply
/// overrides from `lookup`.
pub fn load_layers<F>(layers: &[PathBuf], lookup: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Table::new();
    let mut sources = Vec::with_capacity(layers.len());

    for path in layers {
        let loaded = path.is_file();
        if loaded {
            merge_tables(&mut merged, read_table(path)?);
            tracing::debug!(path = %path.display(), "Loaded config layer");
        }
        sources.push(ConfigSource {
            path: path.clone(),
            loaded,
        });
    }

    let mut config: SetlistConfig = merged.try_into()?;
    config.apply_env_from(lookup)?;

    Ok(LoadedConfig { config, sources })
}

/// Load config from a specific file path (no discovery, no env overrides).
pub fn load_config_file(path: &Path) -> Result<SetlistConfig> {
    Ok(read_table(path)?.try_into()?)
}

/// User config directory: `$SETLIST_CONFIG_DIR` or `<platform config dir>/setlist`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

fn read_table(path: &Path) -> Result<Table> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(contents.parse::<Table>()?)
}

/// Deep-merge `overlay` into `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
