//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GazeError, GazeResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where calibration data is persisted.
    pub data_dir: PathBuf,

    /// Tracking pipeline parameters.
    pub tracking: TrackingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Tracking and calibration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingDefaults {
    /// EMA weight of the newest sample, in `(0, 1]`.
    pub smoothing_alpha: f64,

    /// How many recent raw points are retained for calibration sampling.
    pub buffer_capacity: usize,

    /// How many of the most recent raw points are averaged per calibration click.
    pub capture_count: usize,

    /// Samples required before a calibration may be finished.
    pub min_samples_to_finish: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "gazetile=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs_default_data(),
            tracking: TrackingDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.3,
            buffer_capacity: 200,
            capture_count: 20,
            min_samples_to_finish: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl TrackingDefaults {
    /// Reject parameter combinations the pipeline cannot honor.
    pub fn validate(&self) -> GazeResult<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(GazeError::config(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if self.buffer_capacity == 0 {
            return Err(GazeError::config("buffer_capacity must be at least 1"));
        }
        if self.capture_count == 0 {
            return Err(GazeError::config("capture_count must be at least 1"));
        }
        // The affine fit needs three correspondences.
        if self.min_samples_to_finish < 3 {
            return Err(GazeError::config(format!(
                "min_samples_to_finish must be at least 3, got {}",
                self.min_samples_to_finish
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => match config.tracking.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("gazetile").join("config.json")
}

/// Default data directory.
fn dirs_default_data() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("gazetile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = TrackingDefaults::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.buffer_capacity, 200);
        assert_eq!(defaults.capture_count, 20);
        assert_eq!(defaults.min_samples_to_finish, 5);
    }

    #[test]
    fn test_alpha_out_of_range_rejected() {
        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            let cfg = TrackingDefaults {
                smoothing_alpha: alpha,
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "alpha={alpha} should be rejected");
        }

        let cfg = TrackingDefaults {
            smoothing_alpha: 1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_min_samples_below_fit_minimum_rejected() {
        let cfg = TrackingDefaults {
            min_samples_to_finish: 2,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_tracking_section_uses_defaults() {
        let cfg: TrackingDefaults = serde_json::from_str(r#"{"smoothing_alpha": 0.5}"#).unwrap();
        assert_eq!(cfg.smoothing_alpha, 0.5);
        assert_eq!(cfg.buffer_capacity, 200);
    }

    #[test]
    fn test_partial_app_config_fills_missing_sections() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"data_dir": "/var/lib/gazetile", "logging": {"json": true}}"#)
                .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/gazetile"));
        assert!(cfg.logging.json);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.tracking.smoothing_alpha, 0.3);
    }
}
