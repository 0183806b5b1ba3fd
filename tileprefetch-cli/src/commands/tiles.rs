//! Tiles command - print the tiles needed for an area.
//!
//! The output is one key per line and can be passed back to `run` as a
//! layer's tile list.

use std::io::{self, Write};

use tileprefetch::coord::tiles_intersecting;
use tileprefetch::tile::SnapshotError;

use super::common::parse_bbox;
use crate::error::CliError;

/// Arguments for the tiles command.
pub struct TilesArgs {
    pub bbox: String,
    pub zoom: u8,
}

/// Run the tiles command.
pub fn run(args: TilesArgs) -> Result<(), CliError> {
    let bounds = parse_bbox(&args.bbox)?;
    let keys = tiles_intersecting(&bounds, args.zoom).map_err(SnapshotError::from)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for key in &keys {
        // A closed pipe (e.g. `| head`) ends the listing
        if writeln!(out, "{}", key).is_err() {
            break;
        }
    }

    eprintln!("{} tiles at zoom {}", keys.len(), args.zoom);
    Ok(())
}
