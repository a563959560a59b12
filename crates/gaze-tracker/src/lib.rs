//! GazeTile Tracker
//!
//! Connects a point-of-regard sensor to the processing pipeline. Each
//! sensor tick flows through a single tracking session in order:
//!
//! 1. buffer the raw point (for calibration sampling)
//! 2. apply the current affine correction
//! 3. smooth
//! 4. resolve the tile under the smoothed coordinate
//!
//! Sensors deliver readings through a single-consumer channel; the tracker
//! processes them one at a time, so the pipeline is never re-entered.
//! Calibrations are persisted through a pluggable key-value store.

pub mod sensor;
pub mod session;
pub mod store;
pub mod tracker;

use tokio::sync::mpsc;

use gazetile_common::error::GazeResult;
use gazetile_model::point::SensorReading;

pub use session::{GazeFrame, TrackingSession};
pub use store::{CalibrationStore, FileStore, KeyValueStore, MemoryStore};
pub use tracker::{GazeTracker, TrackerStatus};

/// Where a sensor delivers its readings.
pub type ReadingSender = mpsc::Sender<SensorReading>;

/// Trait for point-of-regard sensors.
pub trait GazeSensor: Send {
    /// Sensor name for logging.
    fn name(&self) -> &str;

    /// Begin delivering readings to `listener`. A `None` reading marks a
    /// tick where the sensor lost tracking.
    fn start(&mut self, listener: ReadingSender) -> GazeResult<()>;

    /// Stop delivering readings and release the listener.
    fn stop(&mut self) -> GazeResult<()>;
}
