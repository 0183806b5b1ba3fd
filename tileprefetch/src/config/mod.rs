//! Configuration file handling for `~/.tileprefetch/config.ini`.
//!
//! Settings structs live in [`settings`], INI mapping in [`parser`] and
//! size strings in [`size`]. A missing file yields defaults; CLI flags are
//! applied on top by the caller.

mod parser;
mod settings;
mod size;

pub use settings::{
    AreaSettings, CacheSettings, ConfigFile, DownloadSettings, LayerSettings, LoggingSettings,
    DEFAULT_LATENCY_MS, DEFAULT_ZOOM,
};
pub use size::{format_size, parse_size, SizeParseError};

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A value could not be interpreted.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(section: &str, key: &str, value: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Default config location, `~/.tileprefetch/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileprefetch")
        .join("config.ini")
}

impl ConfigFile {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults. Relative tile list paths
    /// are resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(ini::Error::Io)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_ini_str(&text, base)
    }

    /// Parse configuration from INI text, resolving paths against `base`.
    pub fn from_ini_str(text: &str, base: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::ReadError(ini::Error::Parse(e)))?;
        parser::parse_ini(&ini, base)
    }
}
