//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::ValueEnum;
use tileprefetch::config::ConfigFile;
use tileprefetch::coord::GeoBounds;
use tileprefetch::tile::TileSource;
use tileprefetch::{LayerId, TileKeySet};

use crate::error::CliError;

/// Map layer selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LayerArg {
    /// Aerial imagery
    Aerial,
    /// Mapnik street map
    Mapnik,
}

impl From<LayerArg> for LayerId {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Aerial => LayerId::Aerial,
            LayerArg::Mapnik => LayerId::Mapnik,
        }
    }
}

/// Parse a `min_lat,min_lon,max_lat,max_lon` argument.
pub fn parse_bbox(value: &str) -> Result<GeoBounds, CliError> {
    GeoBounds::parse(value).map_err(|e| CliError::Config(format!("--bbox: {}", e)))
}

/// Settings given on the command line, applied over the config file.
#[derive(Debug, Default, Clone)]
pub struct SessionOverrides {
    pub aerial_tiles: Option<PathBuf>,
    pub mapnik_tiles: Option<PathBuf>,
    pub bbox: Option<String>,
    pub zoom: Option<u8>,
    pub latency_ms: Option<u64>,
    pub failure_rate: Option<f64>,
}

impl SessionOverrides {
    /// Apply the overrides to a loaded config. CLI takes precedence.
    pub fn apply(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        if let Some(path) = &self.aerial_tiles {
            config.aerial.tiles = Some(path.clone());
        }
        if let Some(path) = &self.mapnik_tiles {
            config.mapnik.tiles = Some(path.clone());
        }
        if let Some(bbox) = &self.bbox {
            config.area.bbox = Some(parse_bbox(bbox)?);
        }
        if let Some(zoom) = self.zoom {
            config.area.zoom = zoom;
        }
        if let Some(latency) = self.latency_ms {
            config.download.latency_ms = latency;
        }
        if let Some(rate) = self.failure_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(CliError::Config(format!(
                    "--failure-rate must be between 0.0 and 1.0, got {}",
                    rate
                )));
            }
            config.download.failure_rate = rate;
        }
        Ok(())
    }
}

/// Build the tiles-needed snapshot for one layer.
pub fn load_layer_tiles(config: &ConfigFile, layer: LayerId) -> Result<TileKeySet, CliError> {
    let source = TileSource::select(
        config.layer(layer).tiles.as_deref(),
        config.area.bbox,
        config.area.zoom,
    );
    Ok(source.load()?)
}
