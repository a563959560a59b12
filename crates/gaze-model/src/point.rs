//! Gaze point types for the sensor stream.
//!
//! Recorded streams are stored as JSONL, one reading per line. A `null`
//! line records a tick where the sensor lost tracking.

use serde::{Deserialize, Serialize};

/// Milliseconds since tracking start.
pub type TimestampMs = f64;

/// A point-of-regard estimate as delivered by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    /// Sensor-space X coordinate (pixels).
    pub x: f64,
    /// Sensor-space Y coordinate (pixels).
    pub y: f64,
    /// Sensor-reported timestamp, if the sensor provides one.
    #[serde(default, rename = "t", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<TimestampMs>,
}

/// One sensor tick. `None` means the sensor had no estimate for this tick.
pub type SensorReading = Option<GazePoint>;

impl GazePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            timestamp: None,
        }
    }

    pub fn with_timestamp(x: f64, y: f64, timestamp: TimestampMs) -> Self {
        Self {
            x,
            y,
            timestamp: Some(timestamp),
        }
    }
}

/// A raw sensor point stamped on arrival, as retained for calibration sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
    /// Arrival time in milliseconds since tracking start.
    #[serde(rename = "t")]
    pub timestamp: TimestampMs,
}

impl RawPoint {
    pub fn new(x: f64, y: f64, timestamp: TimestampMs) -> Self {
        Self { x, y, timestamp }
    }
}

/// Error raised while parsing a recorded reading stream.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ReadingParseError {
    /// One-based line number in the input.
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Parse sensor readings from JSONL content (one JSON value per line).
///
/// Blank lines and `#` comments are skipped; a literal `null` yields a
/// lost-tracking tick.
pub fn parse_readings(jsonl: &str) -> Result<Vec<SensorReading>, ReadingParseError> {
    jsonl
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, content)| {
            serde_json::from_str::<SensorReading>(content)
                .map_err(|source| ReadingParseError { line, source })
        })
        .collect()
}
