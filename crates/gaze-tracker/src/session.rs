//! Per-tick tracking pipeline.
//!
//! A [`TrackingSession`] owns everything one tracking run mutates: the
//! raw-point history, the smoother state, and the active correction. It is
//! created when tracking starts and dropped when it stops, so nothing leaks
//! from one run into the next.

use serde::{Deserialize, Serialize};

use gazetile_common::clock::SessionClock;
use gazetile_common::config::TrackingDefaults;
use gazetile_common::error::GazeResult;
use gazetile_model::affine::AffineTransform;
use gazetile_model::geometry::Point2D;
use gazetile_model::point::{RawPoint, SensorReading};
use gazetile_processing_core::hit_test::{resolve, HitResult, SceneQuery};
use gazetile_processing_core::ring_buffer::RawPointBuffer;
use gazetile_processing_core::smoother::EmaSmoother;

/// Everything one processed tick produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeFrame {
    /// The reading as buffered, stamped with session time.
    pub raw: RawPoint,
    /// After the affine correction.
    pub corrected: Point2D,
    /// After smoothing; this is the coordinate that was hit-tested.
    pub smoothed: Point2D,
    pub hit: HitResult,
}

/// State owned by a single active tracking run.
#[derive(Debug)]
pub struct TrackingSession {
    buffer: RawPointBuffer,
    smoother: EmaSmoother,
    correction: AffineTransform,
    clock: SessionClock,
    frames: u64,
    lost_ticks: u64,
}

impl TrackingSession {
    pub fn new(config: &TrackingDefaults, correction: AffineTransform) -> GazeResult<Self> {
        Ok(Self {
            buffer: RawPointBuffer::new(config.buffer_capacity),
            smoother: EmaSmoother::new(config.smoothing_alpha)?,
            correction,
            clock: SessionClock::start(),
            frames: 0,
            lost_ticks: 0,
        })
    }

    /// Run one sensor tick through buffer, correction, smoothing, and hit test.
    ///
    /// A `None` reading (sensor lost tracking) is skipped without touching
    /// the buffer or the smoother.
    pub fn process<Q: SceneQuery + ?Sized>(
        &mut self,
        reading: SensorReading,
        scene: &Q,
    ) -> Option<GazeFrame> {
        let Some(point) = reading else {
            self.lost_ticks += 1;
            tracing::trace!(lost_ticks = self.lost_ticks, "Sensor lost tracking");
            return None;
        };

        let raw = RawPoint::new(point.x, point.y, self.clock.elapsed_ms());
        self.buffer.push(raw);

        let corrected = self.correction.apply(Point2D::new(point.x, point.y));
        let smoothed = self.smoother.next(corrected.x, corrected.y);
        let hit = resolve(smoothed.x, smoothed.y, scene);
        self.frames += 1;

        Some(GazeFrame {
            raw,
            corrected,
            smoothed,
            hit,
        })
    }

    /// Swap in a new correction. Smoothing continues from its current state.
    pub fn set_correction(&mut self, correction: AffineTransform) {
        self.correction = correction;
    }

    pub fn correction(&self) -> &AffineTransform {
        &self.correction
    }

    /// Recent raw points, oldest first.
    pub fn buffer(&self) -> &RawPointBuffer {
        &self.buffer
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Ticks that produced a frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Ticks skipped because the sensor had no estimate.
    pub fn lost_ticks(&self) -> u64 {
        self.lost_ticks
    }
}
