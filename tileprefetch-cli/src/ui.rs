//! Terminal progress display for a download session.
//!
//! One bar per layer shows tiles downloaded out of tiles needed. A spinner
//! line above them shows whether any download is active; while it is,
//! leaving the session stops the running queues.

use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use tileprefetch::{LayerId, PrefetchEvent, QueueState, QueueStatus};

const ACTIVE_MESSAGE: &str = "downloads active, quit stops them";
const INACTIVE_MESSAGE: &str = "no downloads active";

/// Progress bars for both layers plus the active-download indicator.
pub struct ProgressDisplay {
    multi: MultiProgress,
    header: ProgressBar,
    aerial: ProgressBar,
    mapnik: ProgressBar,
}

impl ProgressDisplay {
    /// Creates a display drawing to stderr.
    pub fn new(statuses: &[QueueStatus; 2]) -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), statuses)
    }

    /// Creates a display that draws nothing.
    pub fn hidden(statuses: &[QueueStatus; 2]) -> Self {
        Self::with_target(ProgressDrawTarget::hidden(), statuses)
    }

    fn with_target(target: ProgressDrawTarget, statuses: &[QueueStatus; 2]) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let header = multi.add(ProgressBar::new_spinner());
        header.set_style(
            ProgressStyle::with_template("{spinner:.yellow} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        header.set_message(INACTIVE_MESSAGE);

        let [aerial, mapnik] = (*statuses).map(|status| {
            let bar = multi.add(ProgressBar::new(status.tiles_needed as u64));
            bar.set_style(
                ProgressStyle::with_template(
                    "{prefix:>7} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
            );
            bar.set_prefix(status.layer.as_str());
            bar.set_position((status.tiles_needed - status.remaining) as u64);
            bar.set_message(idle_label(&bar));
            bar
        });

        Self {
            multi,
            header,
            aerial,
            mapnik,
        }
    }

    /// The bar for a layer.
    pub fn bar(&self, layer: LayerId) -> &ProgressBar {
        match layer {
            LayerId::Aerial => &self.aerial,
            LayerId::Mapnik => &self.mapnik,
        }
    }

    /// Current text of the active-download indicator.
    pub fn header_message(&self) -> String {
        self.header.message()
    }

    /// Updates the display for one queue event.
    pub fn apply(&self, event: PrefetchEvent) {
        match event {
            PrefetchEvent::Remaining { layer, remaining } => {
                let bar = self.bar(layer);
                let needed = bar.length().unwrap_or(0);
                bar.set_position(needed.saturating_sub(remaining as u64));
            }
            PrefetchEvent::StateChanged { layer, state } => {
                let bar = self.bar(layer);
                match state {
                    QueueState::Running => bar.set_message("downloading"),
                    QueueState::Idle => bar.set_message(idle_label(bar)),
                }
            }
            PrefetchEvent::Exhausted { layer } => {
                self.println(format!(
                    "{} all {} tiles downloaded",
                    style(layer.as_str()).bold(),
                    self.bar(layer).length().unwrap_or(0)
                ));
            }
            PrefetchEvent::DownloadsActive { active: true } => {
                self.header.set_message(ACTIVE_MESSAGE);
                self.header.enable_steady_tick(Duration::from_millis(100));
            }
            PrefetchEvent::DownloadsActive { active: false } => {
                self.header.disable_steady_tick();
                self.header.set_message(INACTIVE_MESSAGE);
            }
        }
    }

    /// Prints a line above the bars.
    pub fn println(&self, line: impl AsRef<str>) {
        // Nothing useful to do if the terminal is gone
        let _ = self.multi.println(line);
    }

    /// Leaves the bars on screen in their final state.
    pub fn finish(&self) {
        self.header.finish_with_message(INACTIVE_MESSAGE);
        self.aerial.abandon();
        self.mapnik.abandon();
    }
}

fn idle_label(bar: &ProgressBar) -> &'static str {
    match bar.length() {
        Some(len) if bar.position() >= len => "complete",
        _ if bar.position() == 0 => "idle",
        _ => "stopped",
    }
}
