//! TilePrefetch - offline map tile download queues
//!
//! Downloads the tiles a map layer needs for offline use, one at a time, with
//! per-layer start/stop control and a shared count of running downloads.
//!
//! - [`tile`]: tile keys and the LIFO pending set
//! - [`queue`]: the per-layer download state machine
//! - [`registry`]: owns both layer queues and the active count
//! - [`fetcher`]: the fetch-and-cache collaborator
//! - [`events`]: what the Controller is told

pub mod config;
pub mod coord;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod layer;
pub mod logging;
pub mod queue;
pub mod registry;
pub mod tile;

pub use error::{PrefetchError, PrefetchResult};
pub use events::{EventReceiver, PrefetchEvent, QueueState};
pub use fetcher::{BoxFuture, CachingFetcher, SimulatedDownloader, TileDownloader, TileFetcher};
pub use layer::LayerId;
pub use queue::{DownloadQueue, QueueStatus};
pub use registry::{LayerSetup, QueueRegistry, RegistryConfig};
pub use tile::{TileKey, TileKeySet};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
