//! Fit a calibration from recorded samples.

use std::path::PathBuf;

use anyhow::Context;

use gazetile_model::calibration::CalibrationSample;
use gazetile_processing_core::affine_fit::{fit_samples, FitOutcome};
use gazetile_tracker::{CalibrationStore, FileStore};

pub fn run(samples_path: PathBuf, store_dir: PathBuf, save: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&samples_path)
        .with_context(|| format!("Failed to read samples from {}", samples_path.display()))?;
    let samples: Vec<CalibrationSample> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid samples file {}", samples_path.display()))?;

    let fit = fit_samples(&samples);
    let t = fit.transform;

    println!("Samples: {}", fit.points);
    println!("Outcome: {:?}", fit.outcome);
    println!("Transform:");
    println!("  x' = {:.6}·x + {:.6}·y + {:.3}", t.a11, t.a12, t.b1);
    println!("  y' = {:.6}·x + {:.6}·y + {:.3}", t.a21, t.a22, t.b2);
    if let Some(rms) = fit.rms_error {
        println!("RMS residual: {rms:.3}px");
    }

    if fit.outcome != FitOutcome::Solved {
        println!();
        println!("Samples do not determine a calibration; identity would be used.");
    }

    if save {
        let mut store = CalibrationStore::new(FileStore::new(&store_dir));
        store
            .save(&t)
            .map_err(|e| anyhow::anyhow!("Failed to save calibration: {e}"))?;
        println!();
        println!(
            "Saved to {}",
            store_dir.join(format!("{}.json", store.key())).display()
        );
    }

    Ok(())
}
