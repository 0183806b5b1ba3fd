//! Integration tests for the offline download queues.
//!
//! These tests drive a [`QueueRegistry`] through real tokio tasks:
//! - Completion-driven draining in LIFO order
//! - Cooperative stop and restart while a fetch is in flight
//! - The shared active count across both layers
//! - End-to-end runs through the caching fetcher
//!
//! Run with: `cargo test --test registry_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use tileprefetch::coord::{tiles_intersecting, GeoBounds};
use tileprefetch::{
    BoxFuture, CachingFetcher, EventReceiver, LayerId, LayerSetup, PrefetchEvent, QueueRegistry,
    QueueState, RegistryConfig, SimulatedDownloader, TileFetcher, TileKey, TileKeySet,
};

// ============================================================================
// Helper Fetchers
// ============================================================================

/// Hands every fetch to the test, which decides when it completes.
struct GatedFetcher {
    requests: mpsc::UnboundedSender<(TileKey, oneshot::Sender<()>)>,
}

type Requests = mpsc::UnboundedReceiver<(TileKey, oneshot::Sender<()>)>;

impl GatedFetcher {
    fn new() -> (Arc<Self>, Requests) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { requests }), rx)
    }
}

impl TileFetcher for GatedFetcher {
    fn fetch(&self, key: TileKey) -> BoxFuture<'_, ()> {
        let (done, wait) = oneshot::channel();
        let _ = self.requests.send((key, done));
        Box::pin(async move {
            let _ = wait.await;
        })
    }
}

/// Completes immediately and counts calls.
#[derive(Default)]
struct InstantFetcher {
    calls: AtomicUsize,
}

impl TileFetcher for InstantFetcher {
    fn fetch(&self, _key: TileKey) -> BoxFuture<'_, ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }
}

/// Never completes.
struct PendingFetcher;

impl TileFetcher for PendingFetcher {
    fn fetch(&self, _key: TileKey) -> BoxFuture<'_, ()> {
        Box::pin(std::future::pending())
    }
}

/// Yields to the scheduler before completing and records every key.
#[derive(Default)]
struct RecordingFetcher {
    fetched: parking_lot::Mutex<Vec<String>>,
}

impl TileFetcher for RecordingFetcher {
    fn fetch(&self, key: TileKey) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.fetched.lock().push(key.into_inner());
        })
    }
}

/// Panics on one key, completes normally on the rest.
struct PanickingFetcher {
    panic_on: &'static str,
    calls: AtomicUsize,
}

impl TileFetcher for PanickingFetcher {
    fn fetch(&self, key: TileKey) -> BoxFuture<'_, ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let panics = key.as_str() == self.panic_on;
        Box::pin(async move {
            if panics {
                panic!("fetcher failed on {}", key);
            }
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

fn keys(names: &[&str]) -> TileKeySet {
    names.iter().map(|n| TileKey::from(*n)).collect()
}

fn setup(names: &[&str], fetcher: Arc<dyn TileFetcher>) -> LayerSetup {
    LayerSetup::new(keys(names), fetcher)
}

fn idle_mapnik() -> LayerSetup {
    setup(&[], Arc::new(InstantFetcher::default()))
}

async fn next_request(requests: &mut Requests) -> (TileKey, oneshot::Sender<()>) {
    timeout(WAIT, requests.recv())
        .await
        .expect("timed out waiting for a fetch")
        .expect("fetch channel closed")
}

async fn next_event(events: &mut EventReceiver) -> PrefetchEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Collects events up to and including `DownloadsActive { active: false }`.
async fn events_until_inactive(events: &mut EventReceiver) -> Vec<PrefetchEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        seen.push(event);
        if event == (PrefetchEvent::DownloadsActive { active: false }) {
            return seen;
        }
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_queue_drains_newest_key_first() {
    let (fetcher, mut requests) = GatedFetcher::new();
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["15,1,1", "15,1,2", "15,1,3"], fetcher),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);

    let mut fetched = Vec::new();
    for _ in 0..3 {
        let (key, done) = next_request(&mut requests).await;
        fetched.push(key.into_inner());
        done.send(()).unwrap();
    }
    assert_eq!(fetched, ["15,1,3", "15,1,2", "15,1,1"]);

    let layer = LayerId::Aerial;
    assert_eq!(
        events_until_inactive(&mut events).await,
        vec![
            PrefetchEvent::StateChanged {
                layer,
                state: QueueState::Running
            },
            PrefetchEvent::DownloadsActive { active: true },
            PrefetchEvent::Remaining { layer, remaining: 2 },
            PrefetchEvent::Remaining { layer, remaining: 1 },
            PrefetchEvent::Remaining { layer, remaining: 0 },
            PrefetchEvent::Exhausted { layer },
            PrefetchEvent::StateChanged {
                layer,
                state: QueueState::Idle
            },
            PrefetchEvent::DownloadsActive { active: false },
        ]
    );
    assert_eq!(registry.active_count(), 0);
    assert!(!registry.status(layer).can_start());
}

#[tokio::test]
async fn test_stop_lets_in_flight_fetch_finish_without_continuing() {
    let (fetcher, mut requests) = GatedFetcher::new();
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a", "b", "c"], fetcher),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    let (key, done) = next_request(&mut requests).await;
    assert_eq!(key.as_str(), "c");

    registry.toggle(LayerId::Aerial);
    assert!(!registry.downloads_active());
    assert_eq!(events_until_inactive(&mut events).await.len(), 4);

    done.send(()).unwrap();
    assert_eq!(
        next_event(&mut events).await,
        PrefetchEvent::Remaining {
            layer: LayerId::Aerial,
            remaining: 2
        }
    );

    let status = registry.status(LayerId::Aerial);
    assert_eq!(status.state, QueueState::Idle);
    assert!(!status.in_flight);
    assert_eq!(status.remaining, 2);
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_restart_while_in_flight_keeps_a_single_chain() {
    let (fetcher, mut requests) = GatedFetcher::new();
    let (registry, _events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a", "b", "c"], fetcher),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    let (first, done) = next_request(&mut requests).await;
    assert_eq!(first.as_str(), "c");

    registry.toggle(LayerId::Aerial);
    registry.toggle(LayerId::Aerial);

    // The held fetch resumes the queue; nothing new was popped
    let status = registry.status(LayerId::Aerial);
    assert!(status.state.is_running());
    assert!(status.in_flight);
    assert_eq!(status.remaining, 2);
    assert_eq!(registry.active_count(), 1);

    done.send(()).unwrap();
    let (second, done) = next_request(&mut requests).await;
    assert_eq!(second.as_str(), "b");
    assert!(requests.try_recv().is_err());

    done.send(()).unwrap();
    let (third, done) = next_request(&mut requests).await;
    assert_eq!(third.as_str(), "a");
    done.send(()).unwrap();

    timeout(WAIT, async {
        while registry.downloads_active() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_both_layers_share_the_active_count() {
    let (aerial, mut aerial_requests) = GatedFetcher::new();
    let (mapnik, mut mapnik_requests) = GatedFetcher::new();
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a1"], aerial),
        setup(&["m1", "m2"], mapnik),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    registry.toggle(LayerId::Mapnik);
    assert_eq!(registry.active_count(), 2);

    // Aerial runs out while mapnik keeps going
    let (_, done) = next_request(&mut aerial_requests).await;
    done.send(()).unwrap();
    loop {
        if next_event(&mut events).await == (PrefetchEvent::Exhausted { layer: LayerId::Aerial }) {
            break;
        }
    }
    assert_eq!(registry.active_count(), 1);
    assert!(registry.downloads_active());

    let (key, _held) = next_request(&mut mapnik_requests).await;
    assert_eq!(key.as_str(), "m2");

    registry.toggle(LayerId::Mapnik);
    assert_eq!(registry.active_count(), 0);
    assert!(!registry.downloads_active());
}

#[tokio::test]
async fn test_stop_all_on_dismissal() {
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a", "b"], Arc::new(PendingFetcher)),
        setup(&["m"], Arc::new(PendingFetcher)),
    )
    .unwrap();

    registry.start(LayerId::Aerial);
    registry.start(LayerId::Mapnik);
    assert_eq!(registry.stop_all(), 2);
    assert_eq!(registry.stop_all(), 0);

    let seen = events_until_inactive(&mut events).await;
    let inactive = seen
        .iter()
        .filter(|e| matches!(e, PrefetchEvent::DownloadsActive { active: false }))
        .count();
    assert_eq!(inactive, 1);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_completion_after_registry_dropped_is_discarded() {
    let (fetcher, mut requests) = GatedFetcher::new();
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a", "b"], fetcher),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    let (_, done) = next_request(&mut requests).await;
    drop(registry);

    // The fetch task is still alive and waiting
    done.send(()).unwrap();

    let mut remaining_events = 0;
    while let Ok(Some(event)) = timeout(WAIT, events.recv()).await {
        if matches!(event, PrefetchEvent::Remaining { .. }) {
            remaining_events += 1;
        }
    }
    assert_eq!(remaining_events, 0);
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_instant_fetcher_chain_completes() {
    let fetcher = Arc::new(InstantFetcher::default());
    let names: Vec<String> = (0..50).map(|i| format!("16,{},7", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default().with_progress_log_interval(10),
        setup(&names, fetcher.clone()),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    let seen = events_until_inactive(&mut events).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 50);
    let remaining: Vec<usize> = seen
        .iter()
        .filter_map(|e| match e {
            PrefetchEvent::Remaining { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(remaining, (0..50).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_panicking_fetch_still_completes() {
    let fetcher = Arc::new(PanickingFetcher {
        panic_on: "b",
        calls: AtomicUsize::new(0),
    });
    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        setup(&["a", "b", "c"], fetcher.clone()),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    let seen = events_until_inactive(&mut events).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert!(seen.contains(&PrefetchEvent::Exhausted {
        layer: LayerId::Aerial
    }));
    let status = registry.status(LayerId::Aerial);
    assert!(!status.in_flight);
    assert_eq!(status.completed(), 3);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_with_real_completions() {
    const KEYS: usize = 47;
    const TOGGLES: usize = 50;

    for round in 0..25 {
        let aerial_names: Vec<String> = (0..KEYS).map(|i| format!("17,{},{}", i, round)).collect();
        let mapnik_names: Vec<String> = (0..KEYS).map(|i| format!("16,{},{}", round, i)).collect();
        let aerial_refs: Vec<&str> = aerial_names.iter().map(String::as_str).collect();
        let mapnik_refs: Vec<&str> = mapnik_names.iter().map(String::as_str).collect();

        let aerial = Arc::new(RecordingFetcher::default());
        let mapnik = Arc::new(RecordingFetcher::default());
        let (registry, mut events) = QueueRegistry::new(
            RegistryConfig::default(),
            setup(&aerial_refs, aerial.clone()),
            setup(&mapnik_refs, mapnik.clone()),
        )
        .unwrap();

        // Interleave toggles with completions running on other workers
        for i in 0..TOGGLES {
            let layer = if (i * 7 + round) % 3 == 0 {
                LayerId::Mapnik
            } else {
                LayerId::Aerial
            };
            registry.toggle(layer);
            assert!(registry.active_count() <= 2);
            for _ in 0..(i % 4) {
                tokio::task::yield_now().await;
            }
        }

        // Let both queues run to the end
        registry.start(LayerId::Aerial);
        registry.start(LayerId::Mapnik);
        timeout(WAIT, async {
            loop {
                let settled = registry
                    .statuses()
                    .iter()
                    .all(|s| s.remaining == 0 && !s.in_flight && !s.state.is_running());
                if settled {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("queues did not settle");

        assert_eq!(registry.active_count(), 0);
        assert!(!registry.downloads_active());

        for (fetcher, names) in [(&aerial, &aerial_names), (&mapnik, &mapnik_names)] {
            let mut fetched = fetcher.fetched.lock().clone();
            fetched.sort();
            let mut expected = names.clone();
            expected.sort();
            assert_eq!(fetched, expected, "round {}: every key fetched exactly once", round);
        }

        let (mut up, mut down) = (0, 0);
        while let Ok(event) = events.try_recv() {
            match event {
                PrefetchEvent::DownloadsActive { active: true } => up += 1,
                PrefetchEvent::DownloadsActive { active: false } => down += 1,
                _ => {}
            }
        }
        assert!(up > 0);
        assert_eq!(up, down, "round {}: unbalanced active crossings", round);
    }
}

#[tokio::test(start_paused = true)]
async fn test_simulated_downloads_fill_the_cache() {
    let bounds = GeoBounds::new(53.50, 9.90, 53.52, 9.94).unwrap();
    let tiles: TileKeySet = tiles_intersecting(&bounds, 14).unwrap().into();
    let needed = tiles.len();
    assert!(needed > 0);

    let downloader = SimulatedDownloader::new(Duration::from_millis(20)).with_failure_rate(0.3);
    let expected_failures = tiles.iter().filter(|k| downloader.fails(k)).count();
    let fetcher = Arc::new(CachingFetcher::new(downloader));

    let (registry, mut events) = QueueRegistry::new(
        RegistryConfig::default(),
        LayerSetup::new(tiles, fetcher.clone()),
        idle_mapnik(),
    )
    .unwrap();

    registry.toggle(LayerId::Aerial);
    events_until_inactive(&mut events).await;
    fetcher.sync().await;

    assert_eq!(fetcher.downloads() as usize, needed);
    assert_eq!(fetcher.failures() as usize, expected_failures);
    assert_eq!(fetcher.cached_count() as usize, needed - expected_failures);
    assert_eq!(registry.status(LayerId::Aerial).remaining, 0);
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Op {
    Toggle(LayerId),
    Start(LayerId),
    Stop(LayerId),
    StopAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let layer = prop_oneof![Just(LayerId::Aerial), Just(LayerId::Mapnik)];
    prop_oneof![
        layer.clone().prop_map(Op::Toggle),
        layer.clone().prop_map(Op::Start),
        layer.prop_map(Op::Stop),
        Just(Op::StopAll),
    ]
}

proptest! {
    #[test]
    fn prop_active_count_matches_running_queues(
        aerial_len in 0usize..3,
        mapnik_len in 0usize..3,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let names = ["a", "b"];
        let (registry, _events) = QueueRegistry::with_runtime(
            runtime.handle().clone(),
            RegistryConfig::default(),
            setup(&names[..aerial_len], Arc::new(PendingFetcher)),
            setup(&names[..mapnik_len], Arc::new(PendingFetcher)),
        );

        for op in ops {
            match op {
                Op::Toggle(layer) => registry.toggle(layer),
                Op::Start(layer) => registry.start(layer),
                Op::Stop(layer) => registry.stop(layer),
                Op::StopAll => {
                    registry.stop_all();
                }
            }

            let running = LayerId::ALL
                .iter()
                .filter(|layer| registry.is_running(**layer))
                .count();
            prop_assert_eq!(registry.active_count(), running);
            prop_assert_eq!(registry.downloads_active(), running > 0);
        }
    }
}
