//! Tile identifiers and the per-layer pending key set.
//!
//! A [`TileKeySet`] is filled once from a tiles-needed snapshot and then
//! drained strictly from the tail. The newest key goes first, so tiles at the
//! end of the intersection list download before those at the start.

mod key;
mod key_set;
mod snapshot;

pub use key::TileKey;
pub use key_set::TileKeySet;
pub use snapshot::{SnapshotError, TileSource};
