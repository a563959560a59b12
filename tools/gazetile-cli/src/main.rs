//! GazeTile CLI: offline tools for gaze calibration and replay.
//!
//! Usage:
//!   gazetile fit <SAMPLES>       Fit a calibration from recorded samples
//!   gazetile replay <READINGS>   Replay a recorded gaze stream over the tile grid
//!   gazetile info                Show configuration and stored calibration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gazetile_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "gazetile",
    about = "Gaze tracking calibration and tile hit-testing",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Calibration store directory (defaults to the configured data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit an affine calibration from a JSON array of samples
    Fit {
        /// Path to the samples file
        samples: PathBuf,

        /// Persist the fitted transform to the calibration store
        #[arg(long)]
        save: bool,
    },

    /// Replay a recorded JSONL gaze stream through the tracking pipeline
    Replay {
        /// Path to the readings file (one JSON point or `null` per line)
        readings: PathBuf,

        /// Scene file (JSON array of nodes); defaults to the tile grid
        #[arg(long)]
        scene: Option<PathBuf>,

        /// Viewport width for the tile grid
        #[arg(long, default_value = "1920")]
        width: f64,

        /// Viewport height for the tile grid
        #[arg(long, default_value = "1080")]
        height: f64,

        /// Smoothing weight of the newest sample, in (0, 1]
        #[arg(long)]
        alpha: Option<f64>,

        /// Milliseconds between replayed readings (0 replays unpaced)
        #[arg(long, default_value = "0")]
        interval_ms: u64,

        /// Ignore the stored calibration and replay uncorrected
        #[arg(long)]
        uncalibrated: bool,

        /// Print every frame as a JSON line instead of tile changes
        #[arg(long)]
        json: bool,
    },

    /// Show configuration and the stored calibration
    Info {
        /// Remove the stored calibration
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    gazetile_common::logging::init_logging(&config.logging);

    let store_dir = cli.store.unwrap_or_else(|| config.data_dir.clone());

    match cli.command {
        Commands::Fit { samples, save } => commands::fit::run(samples, store_dir, save),
        Commands::Replay {
            readings,
            scene,
            width,
            height,
            alpha,
            interval_ms,
            uncalibrated,
            json,
        } => {
            let mut tracking = config.tracking.clone();
            if let Some(alpha) = alpha {
                tracking.smoothing_alpha = alpha;
            }
            commands::replay::run(commands::replay::ReplayArgs {
                readings,
                scene,
                width,
                height,
                interval_ms,
                store_dir: (!uncalibrated).then_some(store_dir),
                json,
                tracking,
            })
            .await
        }
        Commands::Info { clear } => commands::info::run(&config, store_dir, clear),
    }
}
