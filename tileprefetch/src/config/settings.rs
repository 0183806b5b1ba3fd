//! Configuration settings structs.

use std::path::PathBuf;

use super::size::format_size;
use crate::coord::GeoBounds;
use crate::fetcher::DEFAULT_CACHE_SIZE_BYTES;
use crate::layer::LayerId;
use crate::registry::DEFAULT_PROGRESS_LOG_INTERVAL;

/// Default zoom level for bounding-box tile lists.
pub const DEFAULT_ZOOM: u8 = 15;

/// Default simulated fetch latency in milliseconds.
pub const DEFAULT_LATENCY_MS: u64 = 150;

/// Complete user configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub aerial: LayerSettings,
    pub mapnik: LayerSettings,
    pub area: AreaSettings,
    pub download: DownloadSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    pub fn layer(&self, layer: LayerId) -> &LayerSettings {
        match layer {
            LayerId::Aerial => &self.aerial,
            LayerId::Mapnik => &self.mapnik,
        }
    }

    pub fn layer_mut(&mut self, layer: LayerId) -> &mut LayerSettings {
        match layer {
            LayerId::Aerial => &mut self.aerial,
            LayerId::Mapnik => &mut self.mapnik,
        }
    }
}

/// `[aerial]` / `[mapnik]` sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSettings {
    /// File listing the layer's tile keys, one per line.
    pub tiles: Option<PathBuf>,
}

/// `[area]` section: the visible rectangle used when no tile list is given.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSettings {
    pub bbox: Option<GeoBounds>,
    pub zoom: u8,
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            bbox: None,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub latency_ms: u64,
    /// Fraction of simulated fetches that fail (0.0 to 1.0).
    pub failure_rate: f64,
    /// Completions between progress log lines.
    pub progress_log_interval: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
            failure_rate: 0.0,
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub memory_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_CACHE_SIZE_BYTES as usize,
        }
    }
}

impl CacheSettings {
    pub fn memory_size_human(&self) -> String {
        format_size(self.memory_size)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(crate::logging::default_log_dir()),
            file: crate::logging::default_log_file().to_string(),
        }
    }
}
