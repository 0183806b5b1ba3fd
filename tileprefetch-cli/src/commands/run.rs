//! Run command - interactive offline download session.
//!
//! Builds the tiles-needed snapshot for both layers, then reads one command
//! per line from stdin while queue events drive the progress display:
//!
//! - `aerial`, `mapnik` - start or stop that layer's queue
//! - `status` - print both queues
//! - `help` - list commands
//! - `quit` - stop everything and exit (also on Ctrl+C or end of input)

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use tileprefetch::config::ConfigFile;
use tileprefetch::{
    CachingFetcher, LayerId, LayerSetup, QueueRegistry, QueueStatus, RegistryConfig,
    SimulatedDownloader, TileKeySet,
};

use super::common::{load_layer_tiles, LayerArg, SessionOverrides};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::ProgressDisplay;

type LayerFetcher = CachingFetcher<SimulatedDownloader>;

/// Arguments for the run command.
#[derive(Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub overrides: SessionOverrides,
    pub start: Vec<LayerArg>,
}

/// One line of session input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Toggle(LayerId),
    Status,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses a line; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let word = line.trim().to_lowercase();
        let command = match word.as_str() {
            "" => return Ok(None),
            "status" | "s" => SessionCommand::Status,
            "help" | "?" => SessionCommand::Help,
            "quit" | "q" | "exit" => SessionCommand::Quit,
            other => LayerId::from_str(other)
                .map(SessionCommand::Toggle)
                .map_err(|_| format!("Unknown command '{}', type 'help' for commands", other))?,
        };
        Ok(Some(command))
    }
}

const HELP: &[&str] = &[
    "Commands:",
    "  aerial   start or stop aerial downloads",
    "  mapnik   start or stop mapnik downloads",
    "  status   show both queues",
    "  quit     stop all downloads and exit",
];

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("run");

    let mut config = runner.config().clone();
    args.overrides.apply(&mut config)?;

    let aerial = load_layer_tiles(&config, LayerId::Aerial)?;
    let mapnik = load_layer_tiles(&config, LayerId::Mapnik)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let autostart: Vec<LayerId> = args.start.into_iter().map(LayerId::from).collect();
    let result = runtime.block_on(session(&config, aerial, mapnik, autostart, shutdown_rx));

    // The stdin reader may still be blocked on a read
    runtime.shutdown_background();
    result
}

fn build_fetcher(config: &ConfigFile) -> Arc<LayerFetcher> {
    let downloader = SimulatedDownloader::new(Duration::from_millis(config.download.latency_ms))
        .with_failure_rate(config.download.failure_rate);
    Arc::new(CachingFetcher::with_capacity(
        downloader,
        config.cache.memory_size as u64,
    ))
}

async fn session(
    config: &ConfigFile,
    aerial: TileKeySet,
    mapnik: TileKeySet,
    autostart: Vec<LayerId>,
    mut shutdown: mpsc::UnboundedReceiver<()>,
) -> Result<(), CliError> {
    // Keys are "zoom,x,y" in both layers, so each layer gets its own cache
    let fetchers = [build_fetcher(config), build_fetcher(config)];
    let registry_config = RegistryConfig::default()
        .with_progress_log_interval(config.download.progress_log_interval);

    let (registry, mut events) = QueueRegistry::new(
        registry_config,
        LayerSetup::new(aerial, fetchers[0].clone()),
        LayerSetup::new(mapnik, fetchers[1].clone()),
    )?;

    println!("{}", style("TilePrefetch offline download").bold());
    for status in registry.statuses() {
        println!(
            "  {:<7} {} tiles needed",
            style(status.layer.as_str()).cyan(),
            status.tiles_needed
        );
    }
    println!("Cache: {} per layer", config.cache.memory_size_human());
    println!("Type 'help' for commands.");
    println!();

    let display = ProgressDisplay::new(&registry.statuses());
    for layer in autostart {
        if registry.status(layer).can_start() {
            registry.start(layer);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => display.apply(event),
            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::Input)? else {
                    info!("End of input");
                    break;
                };
                match SessionCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if execute(&registry, &display, command).is_break() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => display.println(message),
                }
            }
            _ = shutdown.recv() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    let stopped = registry.stop_all();
    while let Ok(event) = events.try_recv() {
        display.apply(event);
    }
    display.finish();

    print_summary(&registry.statuses(), &fetchers, stopped);
    Ok(())
}

/// Applies one command. Returns `Break` when the session should end.
fn execute(
    registry: &QueueRegistry,
    display: &ProgressDisplay,
    command: SessionCommand,
) -> ControlFlow<()> {
    match command {
        SessionCommand::Toggle(layer) => {
            if registry.status(layer).can_start() {
                registry.toggle(layer);
            } else {
                display.println(format!("{}: nothing left to download", layer));
            }
        }
        SessionCommand::Status => {
            for line in status_lines(&registry.statuses(), registry.active_count()) {
                display.println(line);
            }
        }
        SessionCommand::Help => {
            for line in HELP {
                display.println(line);
            }
        }
        SessionCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn status_lines(statuses: &[QueueStatus; 2], active: usize) -> Vec<String> {
    let mut lines: Vec<String> = statuses
        .iter()
        .map(|status| {
            let state = if status.state.is_running() {
                "running"
            } else {
                "idle"
            };
            format!(
                "{:<7} {:<8} {} of {} remaining",
                status.layer.as_str(),
                state,
                status.remaining,
                status.tiles_needed
            )
        })
        .collect();

    lines.push(match active {
        0 => "no downloads active".to_string(),
        1 => "downloads active: 1 queue".to_string(),
        n => format!("downloads active: {} queues", n),
    });
    lines
}

fn print_summary(statuses: &[QueueStatus; 2], fetchers: &[Arc<LayerFetcher>; 2], stopped: usize) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    for (status, fetcher) in statuses.iter().zip(fetchers) {
        println!(
            "{}",
            summary_line(status, fetcher.downloads(), fetcher.failures())
        );
    }
    if stopped > 0 {
        println!("  Stopped {} running queue(s) on exit", stopped);
    }
}

fn summary_line(status: &QueueStatus, downloads: u64, failures: u64) -> String {
    let mut line = format!(
        "  {:<7} {} of {} tiles fetched, {} downloads, {} failed",
        status.layer.as_str(),
        status.completed(),
        status.tiles_needed,
        downloads,
        failures
    );
    if status.in_flight {
        line.push_str(", 1 abandoned in flight");
    }
    line
}
