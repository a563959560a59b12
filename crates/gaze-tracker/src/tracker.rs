//! Tracker lifecycle: sensor, tracking session, and calibration hand-off.

use tokio::sync::mpsc;

use gazetile_common::config::TrackingDefaults;
use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::affine::AffineTransform;
use gazetile_model::calibration::CalibrationSample;
use gazetile_model::geometry::ViewportSize;
use gazetile_model::point::SensorReading;
use gazetile_processing_core::affine_fit::AffineFit;
use gazetile_processing_core::calibration::CalibrationSession;
use gazetile_processing_core::hit_test::SceneQuery;
use gazetile_processing_core::ring_buffer::RawPointBuffer;

use crate::sensor::listener_channel;
use crate::session::{GazeFrame, TrackingSession};
use crate::store::{CalibrationStore, KeyValueStore};
use crate::GazeSensor;

/// Readings buffered between the sensor and the pipeline.
const LISTENER_CAPACITY: usize = 256;

/// Tracker status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    /// Never started.
    Idle,
    /// Sensor attached, readings flowing.
    On,
    /// Stopped after having run.
    Off,
}

/// Drives a sensor through a [`TrackingSession`], one reading at a time.
///
/// Readings are consumed by [`GazeTracker::next_frame`] on the caller's
/// task, so a tick is always fully processed before the next one starts.
pub struct GazeTracker {
    sensor: Box<dyn GazeSensor>,
    config: TrackingDefaults,
    correction: AffineTransform,
    status: TrackerStatus,
    session: Option<TrackingSession>,
    readings: Option<mpsc::Receiver<SensorReading>>,
}

impl GazeTracker {
    /// Create a tracker with the identity correction.
    pub fn new(sensor: Box<dyn GazeSensor>, config: TrackingDefaults) -> GazeResult<Self> {
        config.validate()?;
        Ok(Self {
            sensor,
            config,
            correction: AffineTransform::IDENTITY,
            status: TrackerStatus::Idle,
            session: None,
            readings: None,
        })
    }

    /// Create a tracker using whatever correction the store holds.
    pub fn with_store<K: KeyValueStore>(
        sensor: Box<dyn GazeSensor>,
        config: TrackingDefaults,
        store: &CalibrationStore<K>,
    ) -> GazeResult<Self> {
        let mut tracker = Self::new(sensor, config)?;
        tracker.correction = store.load();
        Ok(tracker)
    }

    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TrackerStatus::On
    }

    pub fn correction(&self) -> &AffineTransform {
        &self.correction
    }

    pub fn config(&self) -> &TrackingDefaults {
        &self.config
    }

    /// The active session, while tracking.
    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    /// Attach the sensor and begin a fresh tracking session.
    pub fn start(&mut self) -> GazeResult<()> {
        if self.is_running() {
            return Err(GazeError::invalid_transition("tracker is already running"));
        }

        let session = TrackingSession::new(&self.config, self.correction)?;
        let (tx, rx) = listener_channel(LISTENER_CAPACITY);
        self.sensor.start(tx)?;

        self.session = Some(session);
        self.readings = Some(rx);
        self.status = TrackerStatus::On;
        tracing::info!(sensor = %self.sensor.name(), "Gaze tracking started");
        Ok(())
    }

    /// Wait for the next reading that produces a frame.
    ///
    /// Lost-tracking ticks are skipped. Returns `None` once the tracker is
    /// stopped or the sensor has closed its stream.
    pub async fn next_frame<Q: SceneQuery + ?Sized>(&mut self, scene: &Q) -> Option<GazeFrame> {
        loop {
            let reading = self.readings.as_mut()?.recv().await?;
            let session = self.session.as_mut()?;
            if let Some(frame) = session.process(reading, scene) {
                return Some(frame);
            }
        }
    }

    /// Detach the sensor, then discard the session.
    ///
    /// After this returns no reading can reach the pipeline. Calling it when
    /// not running is a no-op.
    pub fn stop(&mut self) -> GazeResult<()> {
        if !self.is_running() {
            return Ok(());
        }

        let detached = self.sensor.stop();
        // Closing the receiver discards anything still queued.
        if let Some(mut rx) = self.readings.take() {
            rx.close();
        }
        let session = self.session.take();
        self.status = TrackerStatus::Off;

        if let Some(session) = session {
            tracing::info!(
                frames = session.frames(),
                lost_ticks = session.lost_ticks(),
                "Gaze tracking stopped"
            );
        }
        detached
    }

    /// Open a calibration session sized to the viewport.
    pub fn begin_calibration(&self, viewport: ViewportSize) -> GazeResult<CalibrationSession> {
        CalibrationSession::with_config(viewport, &self.config)
    }

    /// Record a sample from the live buffer.
    ///
    /// When not tracking there are no buffered points and nothing is recorded.
    pub fn record_calibration_sample(
        &self,
        calibration: &mut CalibrationSession,
        target_id: &str,
    ) -> GazeResult<Option<CalibrationSample>> {
        let empty;
        let buffer = match &self.session {
            Some(session) => session.buffer(),
            None => {
                empty = RawPointBuffer::new(1);
                &empty
            }
        };
        Ok(calibration.record_sample(target_id, buffer)?.cloned())
    }

    /// Finish a calibration, make it the live correction, then persist it.
    ///
    /// The correction is applied before saving, so a failed save leaves the
    /// tracker calibrated for this run. Retry persisting with
    /// [`GazeTracker::save_calibration`].
    pub fn complete_calibration<K: KeyValueStore>(
        &mut self,
        calibration: &mut CalibrationSession,
        store: &mut CalibrationStore<K>,
    ) -> GazeResult<AffineFit> {
        let fit = calibration.finish()?;
        self.set_correction(fit.transform);
        store.save(&fit.transform)?;
        Ok(fit)
    }

    /// Persist the fit of an already finished calibration.
    pub fn save_calibration<K: KeyValueStore>(
        &self,
        calibration: &CalibrationSession,
        store: &mut CalibrationStore<K>,
    ) -> GazeResult<()> {
        let fit = calibration
            .fit()
            .ok_or_else(|| GazeError::invalid_transition("calibration has not been fitted"))?;
        store.save(&fit.transform)
    }

    /// Replace the live correction without persisting it.
    pub fn set_correction(&mut self, correction: AffineTransform) {
        self.correction = correction;
        if let Some(session) = self.session.as_mut() {
            session.set_correction(correction);
        }
    }
}

impl Drop for GazeTracker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "Failed to stop sensor on drop");
        }
    }
}
