//! Events emitted to the Controller.
//!
//! The core reports only counts and states. Labels, button titles and spinner
//! animation are the Controller's business.

use tokio::sync::mpsc;

use crate::layer::LayerId;

/// Running state of one download queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueState {
    /// Not downloading; the Controller shows its start affordance.
    Idle,
    /// A download chain is active.
    Running,
}

impl QueueState {
    pub fn is_running(&self) -> bool {
        matches!(self, QueueState::Running)
    }
}

/// A state or progress change the Controller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchEvent {
    /// A fetch completed; `remaining` keys are still pending.
    Remaining { layer: LayerId, remaining: usize },

    /// The queue started, stopped, or ran out of keys.
    StateChanged { layer: LayerId, state: QueueState },

    /// The queue ran out of keys while running.
    Exhausted { layer: LayerId },

    /// The number of running queues crossed to or from zero.
    DownloadsActive { active: bool },
}

/// Receiving half of the registry's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<PrefetchEvent>;

pub(crate) type EventSender = mpsc::UnboundedSender<PrefetchEvent>;
