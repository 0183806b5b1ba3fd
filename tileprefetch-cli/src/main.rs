//! TilePrefetch CLI - Command-line interface
//!
//! Runs interactive offline download sessions and lists the tiles an area
//! needs.

mod commands;
mod error;
mod runner;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::{LayerArg, SessionOverrides};
use commands::run::RunArgs;
use commands::tiles::TilesArgs;

#[derive(Parser)]
#[command(name = "tileprefetch")]
#[command(version, about = "Download map tiles for offline use", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive download session for the aerial and mapnik layers
    Run {
        /// Config file (default: ~/.tileprefetch/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tile list for the aerial layer, one zoom,x,y key per line
        #[arg(long)]
        aerial_tiles: Option<PathBuf>,

        /// Tile list for the mapnik layer, one zoom,x,y key per line
        #[arg(long)]
        mapnik_tiles: Option<PathBuf>,

        /// Area to download when no tile list is given: min_lat,min_lon,max_lat,max_lon
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,

        /// Zoom level for the area
        #[arg(long)]
        zoom: Option<u8>,

        /// Simulated download latency in milliseconds
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Fraction of simulated downloads that fail (0.0 - 1.0)
        #[arg(long)]
        failure_rate: Option<f64>,

        /// Start a layer's queue immediately (repeatable)
        #[arg(long, value_enum)]
        start: Vec<LayerArg>,
    },

    /// Print the tiles needed for an area, one key per line
    Tiles {
        /// Area: min_lat,min_lon,max_lat,max_lon
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,

        /// Zoom level
        #[arg(long, default_value = "15")]
        zoom: u8,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            aerial_tiles,
            mapnik_tiles,
            bbox,
            zoom,
            latency_ms,
            failure_rate,
            start,
        } => commands::run::run(RunArgs {
            config,
            overrides: SessionOverrides {
                aerial_tiles,
                mapnik_tiles,
                bbox,
                zoom,
                latency_ms,
                failure_rate,
            },
            start,
        }),
        Commands::Tiles { bbox, zoom } => commands::tiles::run(TilesArgs { bbox, zoom }),
    };

    if let Err(e) = result {
        e.exit();
    }
}
