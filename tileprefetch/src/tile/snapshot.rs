//! Builds the tiles-needed snapshot a queue starts from.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::TileKeySet;
use crate::coord::{tiles_intersecting, CoordError, GeoBounds};

/// Errors while building a tiles-needed snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read tile list {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// Where a layer's tile keys come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TileSource<'a> {
    /// A key list file, one key per line.
    List(&'a Path),
    /// Every tile intersecting an area at a zoom level.
    Area { bounds: GeoBounds, zoom: u8 },
    /// Nothing to download.
    None,
}

impl<'a> TileSource<'a> {
    /// Picks the source for a layer: an explicit list wins over an area.
    pub fn select(list: Option<&'a Path>, area: Option<GeoBounds>, zoom: u8) -> Self {
        match (list, area) {
            (Some(path), _) => TileSource::List(path),
            (None, Some(bounds)) => TileSource::Area { bounds, zoom },
            (None, None) => TileSource::None,
        }
    }

    /// Computes the snapshot. Called once per session.
    pub fn load(&self) -> Result<TileKeySet, SnapshotError> {
        let keys = match self {
            TileSource::List(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| {
                    SnapshotError::ReadFailed {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                TileKeySet::from_lines(&text)
            }
            TileSource::Area { bounds, zoom } => tiles_intersecting(bounds, *zoom)?.into(),
            TileSource::None => TileKeySet::new(),
        };
        debug!(source = ?self, tiles = keys.len(), "Tiles-needed snapshot built");
        Ok(keys)
    }
}
