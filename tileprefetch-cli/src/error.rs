//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use tileprefetch::config::ConfigError;
use tileprefetch::coord::CoordError;
use tileprefetch::tile::SnapshotError;
use tileprefetch::PrefetchError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build a layer's tile list
    Snapshot(SnapshotError),
    /// Failed to start the async runtime
    Runtime(io::Error),
    /// Failed to create the download queues
    Registry(PrefetchError),
    /// Failed to read commands from stdin
    Input(io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Snapshot(SnapshotError::ReadFailed { .. }) => {
                eprintln!();
                eprintln!("Tile lists hold one key per line in the form zoom,x,y.");
                eprintln!("Generate one with: tileprefetch tiles --bbox <area> --zoom <n>");
            }
            CliError::Snapshot(SnapshotError::Coord(CoordError::TooManyTiles { .. })) => {
                eprintln!();
                eprintln!("Use a smaller area or a lower zoom level.");
            }
            CliError::Snapshot(SnapshotError::Coord(_)) => {
                eprintln!();
                eprintln!("Areas are given as min_lat,min_lon,max_lat,max_lon in degrees.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Snapshot(e) => write!(f, "Failed to build tile list: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Registry(e) => write!(f, "Failed to create download queues: {}", e),
            CliError::Input(e) => write!(f, "Failed to read command: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Snapshot(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Input(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SnapshotError> for CliError {
    fn from(e: SnapshotError) -> Self {
        CliError::Snapshot(e)
    }
}

impl From<PrefetchError> for CliError {
    fn from(e: PrefetchError) -> Self {
        CliError::Registry(e)
    }
}
