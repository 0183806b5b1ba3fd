//! Tile fetch collaborators.
//!
//! The download queues only need a [`TileFetcher`]: something that, given a
//! key, fetches and caches the tile and then completes. How the bytes travel
//! and what happens on failure stays behind that trait.
//!
//! [`CachingFetcher`] is the stock implementation. It wraps a
//! [`TileDownloader`] transport, keeps fetched tiles in an in-memory cache,
//! and swallows download errors after logging them.

mod caching;
mod simulated;

pub use caching::{CachingFetcher, DEFAULT_CACHE_SIZE_BYTES};
pub use simulated::SimulatedDownloader;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::tile::TileKey;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetches one tile and caches it.
///
/// The returned future resolving is the completion signal. It must resolve
/// exactly once per call whether the fetch succeeded or not; no error is
/// reported back to the queue.
pub trait TileFetcher: Send + Sync {
    fn fetch(&self, key: TileKey) -> BoxFuture<'_, ()>;
}

/// Errors from a tile transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// The transport reported a failure for this tile.
    #[error("Download of tile {key} failed: {reason}")]
    Failed { key: String, reason: String },
}

/// Transport that retrieves the raw bytes for a tile.
pub trait TileDownloader: Send + Sync {
    fn download(&self, key: &TileKey) -> BoxFuture<'_, Result<Vec<u8>, DownloadError>>;
}
