//! Web Mercator tile math for building a tiles-needed snapshot.
//!
//! The offline queues are fed once from the set of tiles intersecting the
//! visible area. This module turns a geographic bounding box into that list of
//! [`TileKey`]s.

use std::f64::consts::PI;
use std::fmt;

use thiserror::Error;

use crate::tile::TileKey;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level accepted.
pub const MAX_ZOOM: u8 = 22;

/// Largest number of tiles one area may expand to.
///
/// Roughly half a gigabyte of keys. A whole-world area at high zoom is far
/// above it.
pub const MAX_TILES: u64 = 10_000_000;

/// Errors from coordinate conversion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be at most 22)")]
    InvalidZoom(u8),

    #[error("Area covers {count} tiles, more than the limit of {max}")]
    TooManyTiles { count: u64, max: u64 },

    /// The bounding box minimum exceeds its maximum.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

/// A slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Cache key for this tile, formatted `zoom,x,y`.
    pub fn key(&self) -> TileKey {
        TileKey::new(self.to_string())
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.zoom, self.x, self.y)
    }
}

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Creates validated bounds.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, CoordError> {
        for lat in [min_lat, max_lat] {
            if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }
        for lon in [min_lon, max_lon] {
            if !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(CoordError::InvalidLongitude(lon));
            }
        }
        if min_lat > max_lat || min_lon > max_lon {
            return Err(CoordError::InvalidBounds(format!(
                "{},{} is not south-west of {},{}",
                min_lat, min_lon, max_lat, max_lon
            )));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Parses `min_lat,min_lon,max_lat,max_lon`.
    pub fn parse(s: &str) -> Result<Self, CoordError> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| CoordError::InvalidBounds(format!("'{}': {}", s, e)))?;

        match parts.as_slice() {
            [min_lat, min_lon, max_lat, max_lon] => {
                Self::new(*min_lat, *min_lon, *max_lat, *max_lon)
            }
            _ => Err(CoordError::InvalidBounds(format!(
                "'{}': expected min_lat,min_lon,max_lat,max_lon",
                s
            ))),
        }
    }
}

/// Converts geographic coordinates to the tile containing them.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (1u64 << zoom) as u32 - 1;

    // lon == 180 and lat == MIN_LAT land exactly on the far edge
    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);
    let lat_rad = lat * PI / 180.0;
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileCoord { zoom, x, y })
}

/// Lists every tile at `zoom` intersecting `bounds`.
///
/// Tiles are ordered north to south, west to east within a row. Areas
/// expanding to more than [`MAX_TILES`] tiles are rejected before anything is
/// allocated.
pub fn tiles_intersecting(bounds: &GeoBounds, zoom: u8) -> Result<Vec<TileKey>, CoordError> {
    let north_west = to_tile_coords(bounds.max_lat, bounds.min_lon, zoom)?;
    let south_east = to_tile_coords(bounds.min_lat, bounds.max_lon, zoom)?;

    let count = tile_count(north_west, south_east);
    if count > MAX_TILES {
        return Err(CoordError::TooManyTiles {
            count,
            max: MAX_TILES,
        });
    }

    let mut keys = Vec::with_capacity(count as usize);
    for y in north_west.y..=south_east.y {
        for x in north_west.x..=south_east.x {
            keys.push(TileCoord::new(zoom, x, y).key());
        }
    }
    Ok(keys)
}

/// Tiles in the rectangle spanned by two corners, saturating on overflow.
fn tile_count(north_west: TileCoord, south_east: TileCoord) -> u64 {
    let width = u64::from(south_east.x - north_west.x) + 1;
    let height = u64::from(south_east.y - north_west.y) + 1;
    width.checked_mul(height).unwrap_or(u64::MAX)
}
