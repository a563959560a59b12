//! Show configuration and stored calibration.

use std::path::PathBuf;

use gazetile_common::config::AppConfig;
use gazetile_tracker::{CalibrationStore, FileStore};

pub fn run(config: &AppConfig, store_dir: PathBuf, clear: bool) -> anyhow::Result<()> {
    let mut store = CalibrationStore::new(FileStore::new(&store_dir));

    if clear {
        store
            .clear()
            .map_err(|e| anyhow::anyhow!("Failed to clear calibration: {e}"))?;
        println!("Stored calibration removed.");
        println!();
    }

    let t = &config.tracking;
    println!("Tracking:");
    println!("  Smoothing alpha: {}", t.smoothing_alpha);
    println!("  Raw buffer: {} points", t.buffer_capacity);
    println!("  Points per sample: {}", t.capture_count);
    println!("  Samples to finish: {}", t.min_samples_to_finish);
    if let Err(e) = t.validate() {
        println!("  Invalid: {e}");
    }
    println!();

    println!("Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  JSON: {}", config.logging.json);
    if let Some(ref file) = config.logging.file {
        println!("  File: {}", file.display());
    }
    println!();

    println!("Calibration ({}):", store_dir.display());
    println!("  Key: {}", store.key());
    match store.load_stored() {
        Some(c) => {
            println!("  x' = {:.6}·x + {:.6}·y + {:.3}", c.a11, c.a12, c.b1);
            println!("  y' = {:.6}·x + {:.6}·y + {:.3}", c.a21, c.a22, c.b2);
        }
        None => println!("  None stored (identity)"),
    }

    Ok(())
}
