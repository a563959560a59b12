//! Replay a recorded gaze stream through the tracking pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use gazetile_common::config::TrackingDefaults;
use gazetile_model::geometry::ViewportSize;
use gazetile_model::point::parse_readings;
use gazetile_processing_core::scene::{default_tiles, GridLayout, SceneGraph};
use gazetile_tracker::sensor::ReplaySensor;
use gazetile_tracker::{CalibrationStore, FileStore, GazeTracker};

pub struct ReplayArgs {
    pub readings: PathBuf,
    pub scene: Option<PathBuf>,
    pub width: f64,
    pub height: f64,
    pub interval_ms: u64,
    /// Where to load the correction from; `None` replays uncorrected.
    pub store_dir: Option<PathBuf>,
    pub json: bool,
    pub tracking: TrackingDefaults,
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.readings)
        .with_context(|| format!("Failed to read {}", args.readings.display()))?;
    let readings = parse_readings(&content)
        .with_context(|| format!("Invalid readings in {}", args.readings.display()))?;

    let scene = match &args.scene {
        Some(path) => load_scene(path)?,
        None => SceneGraph::tile_grid(
            ViewportSize::new(args.width, args.height),
            &default_tiles(),
            GridLayout::default(),
        ),
    };

    let total = readings.len();
    let sensor = Box::new(ReplaySensor::new(
        readings,
        Duration::from_millis(args.interval_ms),
    ));
    let mut tracker = match &args.store_dir {
        Some(dir) => {
            let store = CalibrationStore::new(FileStore::new(dir));
            GazeTracker::with_store(sensor, args.tracking, &store)
        }
        None => GazeTracker::new(sensor, args.tracking),
    }
    .map_err(|e| anyhow::anyhow!("Failed to create tracker: {e}"))?;

    if !args.json {
        let c = tracker.correction();
        if c.is_identity() {
            println!("Correction: identity");
        } else {
            println!(
                "Correction: [{:.4} {:.4} {:.2}; {:.4} {:.4} {:.2}]",
                c.a11, c.a12, c.b1, c.a21, c.a22, c.b2
            );
        }
        println!("Replaying {total} readings over {} scene nodes", scene.len());
        println!();
    }

    tracker
        .start()
        .map_err(|e| anyhow::anyhow!("Failed to start tracking: {e}"))?;

    let mut current: Option<String> = None;
    let mut dwell: BTreeMap<String, usize> = BTreeMap::new();
    let mut index = 0usize;

    while let Some(frame) = tracker.next_frame(&scene).await {
        index += 1;
        if args.json {
            println!("{}", serde_json::to_string(&frame)?);
        }

        let tile = frame.hit.element_id.clone();
        if let Some(ref id) = tile {
            *dwell.entry(id.clone()).or_default() += 1;
        }
        if tile != current {
            if !args.json {
                println!(
                    "  #{index:<5} {:>8.1}, {:>8.1}  -> {}",
                    frame.smoothed.x,
                    frame.smoothed.y,
                    tile.as_deref().unwrap_or("(none)")
                );
            }
            current = tile;
        }
    }

    let (frames, lost) = tracker
        .session()
        .map(|s| (s.frames(), s.lost_ticks()))
        .unwrap_or_default();
    tracker
        .stop()
        .map_err(|e| anyhow::anyhow!("Failed to stop tracking: {e}"))?;
    tracing::debug!(frames, lost, "Replay complete");

    if !args.json {
        println!();
        println!("Frames: {frames} ({lost} lost-tracking ticks skipped)");
        if dwell.is_empty() {
            println!("No tile was hit.");
        } else {
            println!("Dwell:");
            for (id, count) in &dwell {
                println!("  {id:<4} {count} frames");
            }
        }
        if let Some(id) = current {
            println!("Last tile: {id}");
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> anyhow::Result<SceneGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid scene {}", path.display()))
}
