//! Count of running queues.

/// Number of queues currently running.
///
/// Only the registry mutates it, always under its state lock. Both mutators
/// report whether the count crossed zero so the registry can tell the
/// Controller to block or release navigation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActiveCounter {
    count: usize,
}

impl ActiveCounter {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    pub fn get(&self) -> usize {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Adds one running queue. Returns true if the count left zero.
    pub fn increment(&mut self) -> bool {
        self.count += 1;
        self.count == 1
    }

    /// Removes one running queue. Returns true if the count reached zero.
    ///
    /// Decrementing at zero is a bookkeeping bug; the count saturates rather
    /// than wrapping.
    pub fn decrement(&mut self) -> bool {
        debug_assert!(self.count > 0, "active counter decremented at zero");
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        self.count == 0
    }
}
