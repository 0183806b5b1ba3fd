//! Fetch-and-cache implementation of [`TileFetcher`] backed by moka.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use super::{BoxFuture, TileDownloader, TileFetcher};
use crate::tile::TileKey;

/// Default in-memory cache budget (64 MB).
pub const DEFAULT_CACHE_SIZE_BYTES: u64 = 64 * 1024 * 1024;

/// Downloads tiles through a [`TileDownloader`] and keeps them in memory.
///
/// Tiles already in the cache complete immediately without a download.
/// Download errors are logged and counted, then the fetch completes as usual.
pub struct CachingFetcher<D> {
    downloader: D,
    cache: MokaCache<TileKey, Vec<u8>>,
    downloads: AtomicU64,
    failures: AtomicU64,
}

impl<D: TileDownloader> CachingFetcher<D> {
    /// Creates a fetcher with the default cache budget.
    pub fn new(downloader: D) -> Self {
        Self::with_capacity(downloader, DEFAULT_CACHE_SIZE_BYTES)
    }

    /// Creates a fetcher whose cache holds at most `max_size_bytes` of tile data.
    pub fn with_capacity(downloader: D, max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            .weigher(|_key: &TileKey, value: &Vec<u8>| -> u32 {
                value.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            downloader,
            cache,
            downloads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Returns true if the tile is cached.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Returns the cached bytes for a tile.
    pub async fn get(&self, key: &TileKey) -> Option<Vec<u8>> {
        self.cache.get(key).await
    }

    /// Number of tiles currently cached.
    ///
    /// moka updates its counters lazily; call [`Self::sync`] first for an
    /// exact figure.
    pub fn cached_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance so counters are current.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Number of downloads attempted.
    pub fn downloads(&self) -> u64 {
        self.downloads.load(Ordering::Relaxed)
    }

    /// Number of downloads that failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// The wrapped transport.
    pub fn downloader(&self) -> &D {
        &self.downloader
    }
}

impl<D: TileDownloader> TileFetcher for CachingFetcher<D> {
    fn fetch(&self, key: TileKey) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.cache.contains_key(&key) {
                debug!(tile = %key, "Tile already cached");
                return;
            }

            self.downloads.fetch_add(1, Ordering::Relaxed);
            match self.downloader.download(&key).await {
                Ok(data) => {
                    debug!(tile = %key, bytes = data.len(), "Tile downloaded");
                    self.cache.insert(key, data).await;
                }
                Err(e) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(tile = %key, error = %e, "Tile download failed");
                }
            }
        })
    }
}
