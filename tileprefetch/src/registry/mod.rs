//! Registry owning both layer queues and the shared active-download count.
//!
//! The Controller talks to a [`QueueRegistry`] only. `toggle` flips a queue
//! between idle and running; fetch completions arrive on tokio tasks and come
//! back through the registry to advance their queue.
//!
//! # Concurrency
//!
//! One `parking_lot::Mutex` guards both queues and the [`ActiveCounter`].
//! Every transition (start, stop, completion, exhaustion) takes it, applies
//! the queue change and the counter change together, emits its events and
//! releases it. Queries take the same lock, so the active count always
//! equals the number of running queues when observed.
//!
//! Nothing blocks under the lock: events go through an unbounded channel
//! and fetches are spawned, never awaited.
//!
//! A fetch that panics counts as completed, so its queue keeps draining and
//! the active count stays exact. A fetch cancelled by runtime shutdown
//! reports nothing.
//!
//! # Example
//!
//! ```ignore
//! use tileprefetch::{LayerId, LayerSetup, QueueRegistry, RegistryConfig};
//!
//! let (registry, mut events) = QueueRegistry::new(
//!     RegistryConfig::default(),
//!     LayerSetup::new(aerial_keys, aerial_fetcher),
//!     LayerSetup::new(mapnik_keys, mapnik_fetcher),
//! )?;
//!
//! registry.toggle(LayerId::Aerial);
//! while let Some(event) = events.recv().await {
//!     // update labels and spinners
//! }
//! ```

mod config;
mod counter;

pub use config::{RegistryConfig, DEFAULT_PROGRESS_LOG_INTERVAL};
pub use counter::ActiveCounter;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{PrefetchError, PrefetchResult};
use crate::events::{EventReceiver, EventSender, PrefetchEvent, QueueState};
use crate::fetcher::TileFetcher;
use crate::layer::LayerId;
use crate::queue::{DownloadQueue, QueueStatus, Step};
use crate::tile::TileKeySet;

/// Keys and fetcher for one layer.
pub struct LayerSetup {
    pub keys: TileKeySet,
    pub fetcher: Arc<dyn TileFetcher>,
}

impl LayerSetup {
    pub fn new(keys: TileKeySet, fetcher: Arc<dyn TileFetcher>) -> Self {
        Self { keys, fetcher }
    }
}

/// Mutable state shared by both queues.
#[derive(Debug)]
struct RegistryState {
    aerial: DownloadQueue,
    mapnik: DownloadQueue,
    active: ActiveCounter,
}

impl RegistryState {
    fn queue(&self, layer: LayerId) -> &DownloadQueue {
        match layer {
            LayerId::Aerial => &self.aerial,
            LayerId::Mapnik => &self.mapnik,
        }
    }

    fn queue_mut(&mut self, layer: LayerId) -> &mut DownloadQueue {
        match layer {
            LayerId::Aerial => &mut self.aerial,
            LayerId::Mapnik => &mut self.mapnik,
        }
    }
}

struct Inner {
    state: Mutex<RegistryState>,
    aerial_fetcher: Arc<dyn TileFetcher>,
    mapnik_fetcher: Arc<dyn TileFetcher>,
    events: EventSender,
    runtime: Handle,
    config: RegistryConfig,
}

/// Owns the aerial and mapnik download queues.
///
/// Cloning is cheap and yields a handle to the same registry. In-flight fetch
/// tasks hold only a weak reference; once every handle is dropped their
/// completions are discarded.
#[derive(Clone)]
pub struct QueueRegistry {
    inner: Arc<Inner>,
}

impl QueueRegistry {
    /// Creates a registry driven by the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoRuntime`] when called outside a runtime.
    pub fn new(
        config: RegistryConfig,
        aerial: LayerSetup,
        mapnik: LayerSetup,
    ) -> PrefetchResult<(Self, EventReceiver)> {
        let runtime = Handle::try_current().map_err(|e| PrefetchError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(runtime, config, aerial, mapnik))
    }

    /// Creates a registry that spawns fetches on the given runtime.
    pub fn with_runtime(
        runtime: Handle,
        config: RegistryConfig,
        aerial: LayerSetup,
        mapnik: LayerSetup,
    ) -> (Self, EventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();

        info!(
            aerial_tiles = aerial.keys.len(),
            mapnik_tiles = mapnik.keys.len(),
            "Offline queues created"
        );

        let state = RegistryState {
            aerial: DownloadQueue::new(LayerId::Aerial, aerial.keys),
            mapnik: DownloadQueue::new(LayerId::Mapnik, mapnik.keys),
            active: ActiveCounter::new(),
        };

        let inner = Inner {
            state: Mutex::new(state),
            aerial_fetcher: aerial.fetcher,
            mapnik_fetcher: mapnik.fetcher,
            events,
            runtime,
            config,
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Starts the layer's queue if idle, stops it if running.
    pub fn toggle(&self, layer: LayerId) {
        let mut state = self.inner.state.lock();
        if state.queue(layer).is_running() {
            self.inner.stop_locked(&mut state, layer);
        } else {
            self.inner.start_locked(&mut state, layer);
        }
    }

    /// Starts the layer's queue. No-op if already running.
    pub fn start(&self, layer: LayerId) {
        let mut state = self.inner.state.lock();
        self.inner.start_locked(&mut state, layer);
    }

    /// Stops the layer's queue. No-op if not running.
    ///
    /// A fetch already in flight is not cancelled; its completion is still
    /// reported and then the chain ends.
    pub fn stop(&self, layer: LayerId) {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state, layer);
    }

    /// Stops every running queue. Returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let mut state = self.inner.state.lock();
        LayerId::ALL
            .into_iter()
            .filter(|layer| self.inner.stop_locked(&mut state, *layer))
            .count()
    }

    pub fn is_running(&self, layer: LayerId) -> bool {
        self.inner.state.lock().queue(layer).is_running()
    }

    pub fn status(&self, layer: LayerId) -> QueueStatus {
        self.inner.state.lock().queue(layer).status()
    }

    /// Status of both layers, taken under one lock.
    pub fn statuses(&self) -> [QueueStatus; 2] {
        let state = self.inner.state.lock();
        LayerId::ALL.map(|layer| state.queue(layer).status())
    }

    /// Number of queues currently running.
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active.get()
    }

    /// Whether any queue is running.
    pub fn downloads_active(&self) -> bool {
        self.inner.state.lock().active.is_active()
    }
}

impl fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("QueueRegistry")
            .field("aerial", &state.aerial.status())
            .field("mapnik", &state.mapnik.status())
            .field("active_count", &state.active.get())
            .finish()
    }
}

impl Inner {
    fn fetcher(&self, layer: LayerId) -> &Arc<dyn TileFetcher> {
        match layer {
            LayerId::Aerial => &self.aerial_fetcher,
            LayerId::Mapnik => &self.mapnik_fetcher,
        }
    }

    fn emit(&self, event: PrefetchEvent) {
        // A dropped receiver means the Controller is gone; progress continues
        let _ = self.events.send(event);
    }

    fn start_locked(self: &Arc<Self>, state: &mut RegistryState, layer: LayerId) {
        if !state.queue_mut(layer).start() {
            debug!(layer = %layer, "Download queue already running");
            return;
        }

        let crossed = state.active.increment();
        info!(
            layer = %layer,
            remaining = state.queue(layer).remaining(),
            active = state.active.get(),
            "Download queue started"
        );
        self.emit(PrefetchEvent::StateChanged {
            layer,
            state: QueueState::Running,
        });
        if crossed {
            self.emit(PrefetchEvent::DownloadsActive { active: true });
        }

        if state.queue(layer).wants_step() {
            self.step_locked(state, layer);
        } else {
            debug!(layer = %layer, "Fetch still in flight, its completion resumes the queue");
        }
    }

    fn stop_locked(&self, state: &mut RegistryState, layer: LayerId) -> bool {
        if !state.queue_mut(layer).stop() {
            debug!(layer = %layer, "Download queue not running");
            return false;
        }

        info!(
            layer = %layer,
            remaining = state.queue(layer).remaining(),
            in_flight = state.queue(layer).is_in_flight(),
            "Download queue stopped"
        );
        self.emit(PrefetchEvent::StateChanged {
            layer,
            state: QueueState::Idle,
        });
        self.release_locked(state);
        true
    }

    fn release_locked(&self, state: &mut RegistryState) {
        if state.active.decrement() {
            self.emit(PrefetchEvent::DownloadsActive { active: false });
        }
    }

    fn step_locked(self: &Arc<Self>, state: &mut RegistryState, layer: LayerId) {
        match state.queue_mut(layer).next_step() {
            Step::Exhausted => {
                info!(layer = %layer, "Download queue exhausted");
                self.emit(PrefetchEvent::Exhausted { layer });
                self.emit(PrefetchEvent::StateChanged {
                    layer,
                    state: QueueState::Idle,
                });
                self.release_locked(state);
            }
            Step::Fetch(key) => {
                debug!(layer = %layer, tile = %key, "Fetching tile");
                let fetcher = Arc::clone(self.fetcher(layer));
                let registry: Weak<Inner> = Arc::downgrade(self);
                let runtime = self.runtime.clone();
                self.runtime.spawn(async move {
                    // The fetch runs in its own task so a panicking fetcher
                    // still completes the step
                    let fetch = runtime.spawn(async move { fetcher.fetch(key).await });
                    match fetch.await {
                        Ok(()) => {}
                        Err(e) if e.is_panic() => {
                            warn!(layer = %layer, "Tile fetch panicked, counting it as complete");
                        }
                        Err(_) => {
                            debug!(layer = %layer, "Tile fetch cancelled, completion discarded");
                            return;
                        }
                    }
                    match registry.upgrade() {
                        Some(inner) => inner.on_fetch_complete(layer),
                        None => debug!(layer = %layer, "Registry dropped, completion discarded"),
                    }
                });
            }
        }
    }

    fn on_fetch_complete(self: &Arc<Self>, layer: LayerId) {
        let mut state = self.state.lock();
        let completion = state.queue_mut(layer).complete();

        self.emit(PrefetchEvent::Remaining {
            layer,
            remaining: completion.remaining,
        });

        let tiles_needed = state.queue(layer).status().tiles_needed;
        if self
            .config
            .should_log_progress(tiles_needed, completion.remaining)
        {
            info!(
                layer = %layer,
                remaining = completion.remaining,
                tiles_needed,
                "Offline download progress"
            );
        }

        if completion.resume {
            self.step_locked(&mut state, layer);
        } else {
            debug!(
                layer = %layer,
                remaining = completion.remaining,
                "Completion after stop, queue stays idle"
            );
        }
    }
}
