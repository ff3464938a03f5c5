//! Configuration management (`<config dir>/config.toml`)
//!
//! Every field carries a serde default so partial files are valid. The
//! default file is optional: when it is missing or unparsable the host runs
//! with defaults. A file named explicitly on the command line must load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::HostError;
use crate::host::HostPaths;
use crate::input::InputConfig;

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Presentation settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Quit key and keyboard-to-joypad bindings
    #[serde(default)]
    pub input: InputConfig,
    /// Directories handed to the core
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Block presentation on display refresh (default: true)
    #[serde(default = "default_true")]
    pub vsync: bool,
}

/// Directory overrides. Unset entries fall back to the platform data dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    #[serde(default)]
    pub system_dir: Option<PathBuf>,
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            vsync: default_true(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", "hwretro", "hwretro")
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/hwretro`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory.
///
/// On Linux: `~/.local/share/hwretro`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads `config.toml` from the platform configuration directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    let Some(path) = config_dir().map(|dir| dir.join("config.toml")) else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using defaults", describe(&e));
            Config::default()
        }
    }
}

/// Loads a configuration file that the user named explicitly.
///
/// # Errors
///
/// Returns [`HostError::Config`] if the file cannot be read or parsed.
pub fn load_from(path: &Path) -> Result<Config, HostError> {
    let content = std::fs::read_to_string(path).map_err(|e| HostError::Config {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let config = toml::from_str(&content).map_err(|e| HostError::Config {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    tracing::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

fn describe(err: &HostError) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}

impl Config {
    /// Resolve the system and save directories handed to the core.
    pub fn host_paths(&self) -> HostPaths {
        let base = data_dir().unwrap_or_else(|| PathBuf::from("."));
        HostPaths {
            system_dir: self
                .paths
                .system_dir
                .clone()
                .unwrap_or_else(|| base.join("system")),
            save_dir: self
                .paths
                .save_dir
                .clone()
                .unwrap_or_else(|| base.join("saves")),
        }
    }
}
