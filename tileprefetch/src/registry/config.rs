//! Registry configuration.

/// Default number of completions between progress log lines.
pub const DEFAULT_PROGRESS_LOG_INTERVAL: usize = 100;

/// Configuration for [`super::QueueRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Log an info line every this many completions per layer (0 disables).
    pub progress_log_interval: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress log interval.
    pub fn with_progress_log_interval(mut self, interval: usize) -> Self {
        self.progress_log_interval = interval;
        self
    }

    /// Whether a completion leaving `remaining` keys should be logged.
    pub(crate) fn should_log_progress(&self, tiles_needed: usize, remaining: usize) -> bool {
        if self.progress_log_interval == 0 {
            return false;
        }
        let done = tiles_needed.saturating_sub(remaining);
        done > 0 && done % self.progress_log_interval == 0
    }
}
