//! Per-layer sequential download queue.
//!
//! A `DownloadQueue` is a small state machine. It does no I/O itself: the
//! registry asks it for the next step, performs the fetch, and reports the
//! completion back. Keeping the transitions pure lets the registry apply them
//! under one lock together with the shared active counter.
//!
//! # State Machine
//!
//! ```text
//! Idle --start--> Running --next_step (keys left)--> Running + in flight
//!                 Running --next_step (no keys)---> Idle (exhausted)
//! Running + in flight --complete--> Running (next_step follows)
//! Running --stop--> Idle (an in-flight fetch still completes, nothing follows)
//! ```
//!
//! Cancellation is cooperative. `stop` only clears the running flag; the
//! completion of a fetch already in flight sees the flag and ends the chain.

use crate::events::QueueState;
use crate::layer::LayerId;
use crate::tile::{TileKey, TileKeySet};

/// What the queue wants to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Fetch this key and report the completion.
    Fetch(TileKey),
    /// No keys remain; the queue has returned to idle.
    Exhausted,
}

/// Outcome of a fetch completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Keys still pending after the completed fetch.
    pub remaining: usize,
    /// Whether the chain continues with another step.
    pub resume: bool,
}

/// Point-in-time view of a queue for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub layer: LayerId,
    /// Size of the tiles-needed snapshot the queue was built from.
    pub tiles_needed: usize,
    /// Keys not yet handed to the fetcher.
    pub remaining: usize,
    pub state: QueueState,
    /// A fetch is outstanding, possibly from before a stop.
    pub in_flight: bool,
}

impl QueueStatus {
    /// Whether the Controller should enable its start/stop control.
    ///
    /// A running queue can always be stopped; an idle one can only start if
    /// keys remain.
    pub fn can_start(&self) -> bool {
        self.remaining > 0 || self.state.is_running()
    }

    /// Keys whose fetch has completed.
    ///
    /// A key handed to the fetcher but not yet completed is not counted.
    pub fn completed(&self) -> usize {
        self.tiles_needed
            .saturating_sub(self.remaining)
            .saturating_sub(usize::from(self.in_flight))
    }
}

/// Pending keys for one layer plus their running state.
#[derive(Debug)]
pub struct DownloadQueue {
    layer: LayerId,
    keys: TileKeySet,
    tiles_needed: usize,
    running: bool,
    in_flight: bool,
}

impl DownloadQueue {
    pub fn new(layer: LayerId, keys: TileKeySet) -> Self {
        let tiles_needed = keys.len();
        Self {
            layer,
            keys,
            tiles_needed,
            running: false,
            in_flight: false,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Keys not yet handed out.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    pub fn state(&self) -> QueueState {
        if self.running {
            QueueState::Running
        } else {
            QueueState::Idle
        }
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            layer: self.layer,
            tiles_needed: self.tiles_needed,
            remaining: self.keys.len(),
            state: self.state(),
            in_flight: self.in_flight,
        }
    }

    /// Marks the queue running. Returns false if it already was.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Marks the queue idle. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Whether a step should be taken now.
    ///
    /// False while a fetch is outstanding: its completion drives the next
    /// step, so restarting before a stale completion arrives does not fork
    /// the chain.
    pub fn wants_step(&self) -> bool {
        self.running && !self.in_flight
    }

    /// Takes the next consumption step.
    ///
    /// Must only be called when [`Self::wants_step`] is true. An empty key set
    /// stops the queue and yields [`Step::Exhausted`].
    pub fn next_step(&mut self) -> Step {
        debug_assert!(self.wants_step(), "next_step called while not ready");

        match self.keys.pop_last() {
            Ok(key) => {
                self.in_flight = true;
                Step::Fetch(key)
            }
            Err(_) => {
                self.running = false;
                Step::Exhausted
            }
        }
    }

    /// Records the completion of the outstanding fetch.
    pub fn complete(&mut self) -> Completion {
        self.in_flight = false;
        Completion {
            remaining: self.keys.len(),
            resume: self.running,
        }
    }
}
