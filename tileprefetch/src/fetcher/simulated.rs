//! Transport stand-in that produces synthetic tiles after a delay.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use super::{BoxFuture, DownloadError, TileDownloader};
use crate::tile::TileKey;

/// Resolution used when turning a failure rate into a hash threshold.
const FAILURE_BUCKETS: u64 = 10_000;

/// Downloader that sleeps for a fixed latency and returns the key bytes.
///
/// A configurable fraction of keys fails. Which keys fail is decided by a
/// hash of the key, so the same key always behaves the same way.
#[derive(Debug, Clone)]
pub struct SimulatedDownloader {
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedDownloader {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failure_rate: 0.0,
        }
    }

    /// Sets the fraction of keys that fail, clamped to `0.0..=1.0`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Returns true if this key is one of the simulated failures.
    pub fn fails(&self, key: &TileKey) -> bool {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let bucket = hasher.finish() % FAILURE_BUCKETS;
        (bucket as f64) < self.failure_rate * FAILURE_BUCKETS as f64
    }
}

impl TileDownloader for SimulatedDownloader {
    fn download(&self, key: &TileKey) -> BoxFuture<'_, Result<Vec<u8>, DownloadError>> {
        let key = key.clone();
        Box::pin(async move {
            tokio::time::sleep(self.latency).await;
            if self.fails(&key) {
                return Err(DownloadError::Failed {
                    reason: "simulated transport failure".to_string(),
                    key: key.into_inner(),
                });
            }
            Ok(key.into_inner().into_bytes())
        })
    }
}
