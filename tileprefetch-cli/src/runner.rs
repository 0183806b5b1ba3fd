//! CLI runner for common setup.
//!
//! Loads the configuration file and initializes logging for commands that
//! run download sessions.

use std::path::Path;

use tracing::info;

use tileprefetch::config::ConfigFile;
use tileprefetch::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a runner from the default config path or an explicit one.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        // Missing files give defaults
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TilePrefetch v{}", tileprefetch::VERSION);
        info!("TilePrefetch CLI: {} command", command);
    }
}
