//! Session clock.
//!
//! Raw points are stamped relative to the moment tracking started, so
//! timestamps inside a session are monotonic regardless of what the
//! sensor reports.

use std::time::Instant;

/// A tracking clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment tracking started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant tracking started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since tracking start.
    pub fn elapsed_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1_000.0
    }

    /// Seconds elapsed since tracking start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at tracking start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert milliseconds to seconds.
    pub fn ms_to_secs(ms: f64) -> f64 {
        ms / 1_000.0
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}
