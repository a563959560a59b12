//! Calibration session state machine.
//!
//! ```text
//! Idle ──record──▶ Collecting ──record (≥ min samples)──▶ Ready ──finish──▶ Fitted
//!                    ▲    │                                 │ ▲
//!                    └────┘ record                          └─┘ record
//! ```
//!
//! A session never persists anything itself: `finish` hands back the fit
//! and the owner decides where it goes. Dropping a session before it is
//! fitted discards it without side effects.

use serde::{Deserialize, Serialize};

use gazetile_common::config::TrackingDefaults;
use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::calibration::{CalibrationSample, CalibrationTarget};
use gazetile_model::geometry::{Point2D, ViewportSize};

use crate::affine_fit::{fit_samples, AffineFit, MIN_POINTS};
use crate::ring_buffer::RawPointBuffer;

/// How many of the most recent raw points are averaged per sample.
pub const DEFAULT_CAPTURE_COUNT: usize = 20;

/// Samples required before `finish` is allowed.
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    /// No samples yet.
    Idle,
    /// Some samples, not enough to finish.
    Collecting,
    /// Enough samples; `finish` is allowed.
    Ready,
    /// Fit computed. Terminal.
    Fitted,
}

/// Collects samples against the nine fixed targets and fits the correction.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    targets: Vec<CalibrationTarget>,
    samples: Vec<CalibrationSample>,
    state: CalibrationState,
    capture_count: usize,
    min_samples_to_finish: usize,
    fit: Option<AffineFit>,
}

impl CalibrationSession {
    /// Create a session for the given viewport with default parameters.
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            targets: CalibrationTarget::standard_grid(viewport),
            samples: Vec::new(),
            state: CalibrationState::Idle,
            capture_count: DEFAULT_CAPTURE_COUNT,
            min_samples_to_finish: DEFAULT_MIN_SAMPLES,
            fit: None,
        }
    }

    /// Create a session using configured capture count and finish threshold.
    pub fn with_config(viewport: ViewportSize, config: &TrackingDefaults) -> GazeResult<Self> {
        if config.capture_count == 0 {
            return Err(GazeError::config("capture_count must be at least 1"));
        }
        if config.min_samples_to_finish < MIN_POINTS {
            return Err(GazeError::config(format!(
                "min_samples_to_finish must be at least {MIN_POINTS}"
            )));
        }
        Ok(Self {
            capture_count: config.capture_count,
            min_samples_to_finish: config.min_samples_to_finish,
            ..Self::new(viewport)
        })
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn targets(&self) -> &[CalibrationTarget] {
        &self.targets
    }

    pub fn target(&self, id: &str) -> Option<&CalibrationTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    pub fn min_samples_to_finish(&self) -> usize {
        self.min_samples_to_finish
    }

    /// Whether `finish` would be accepted now.
    pub fn can_finish(&self) -> bool {
        self.state == CalibrationState::Ready
    }

    /// Whether at least one sample was taken against `target_id`.
    pub fn is_visited(&self, target_id: &str) -> bool {
        self.samples
            .iter()
            .any(|s| s.target_id.as_deref() == Some(target_id))
    }

    /// Samples still needed before finishing is allowed.
    pub fn samples_remaining(&self) -> usize {
        self.min_samples_to_finish.saturating_sub(self.samples.len())
    }

    /// The fit, once the session reached `Fitted`.
    pub fn fit(&self) -> Option<&AffineFit> {
        self.fit.as_ref()
    }

    /// Average the most recent raw points and record them against a target.
    ///
    /// An empty buffer records nothing and returns `Ok(None)`. Recording
    /// after the session is fitted, or against an unknown target, is an error.
    pub fn record_sample(
        &mut self,
        target_id: &str,
        buffer: &RawPointBuffer,
    ) -> GazeResult<Option<&CalibrationSample>> {
        if self.state == CalibrationState::Fitted {
            return Err(GazeError::invalid_transition(
                "cannot record samples after the calibration is fitted",
            ));
        }

        let target = self
            .target(target_id)
            .ok_or_else(|| GazeError::unknown_target(target_id))?
            .position;

        let recent = buffer
            .recent(self.capture_count)
            .map(|p| Point2D::new(p.x, p.y));
        let Some(raw_average) = Point2D::mean(recent) else {
            tracing::debug!(target_id, "No raw points buffered, sample skipped");
            return Ok(None);
        };

        self.samples.push(CalibrationSample {
            raw_average,
            target,
            target_id: Some(target_id.to_string()),
        });
        self.state = if self.samples.len() >= self.min_samples_to_finish {
            CalibrationState::Ready
        } else {
            CalibrationState::Collecting
        };

        tracing::debug!(
            target_id,
            raw_x = raw_average.x,
            raw_y = raw_average.y,
            samples = self.samples.len(),
            state = ?self.state,
            "Calibration sample recorded"
        );

        Ok(self.samples.last())
    }

    /// Fit the correction over all samples and move to `Fitted`.
    ///
    /// Rejected unless the session is `Ready`; a fitted session cannot be
    /// finished again.
    pub fn finish(&mut self) -> GazeResult<AffineFit> {
        if self.state == CalibrationState::Fitted {
            return Err(GazeError::invalid_transition("calibration already fitted"));
        }
        if self.state != CalibrationState::Ready {
            return Err(GazeError::invalid_transition(format!(
                "finish() requires {} samples (state {:?}, {} collected)",
                self.min_samples_to_finish,
                self.state,
                self.samples.len()
            )));
        }

        let fit = fit_samples(&self.samples);
        self.fit = Some(fit);
        self.state = CalibrationState::Fitted;

        tracing::info!(
            samples = self.samples.len(),
            outcome = ?fit.outcome,
            rms_error = ?fit.rms_error,
            "Calibration fitted"
        );

        Ok(fit)
    }

    /// Discard the session. Nothing is persisted.
    pub fn cancel(self) {
        tracing::debug!(
            samples = self.samples.len(),
            state = ?self.state,
            "Calibration cancelled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine_fit::FitOutcome;
    use gazetile_model::affine::AffineTransform;
    use gazetile_model::point::RawPoint;

    fn viewport() -> ViewportSize {
        ViewportSize::new(1920.0, 1080.0)
    }

    fn buffer_at(x: f64, y: f64) -> RawPointBuffer {
        let mut buffer = RawPointBuffer::default();
        for i in 0..30 {
            buffer.push(RawPoint::new(x, y, i as f64));
        }
        buffer
    }

    /// Buffer as the sensor would see it while looking at `target` through
    /// a biased estimator (the inverse of `bias`).
    fn looking_at(session: &CalibrationSession, id: &str, bias: &AffineTransform) -> RawPointBuffer {
        let target = session.target(id).unwrap().position;
        let raw = bias.apply(target);
        buffer_at(raw.x, raw.y)
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = CalibrationSession::new(viewport());
        assert_eq!(session.state(), CalibrationState::Idle);
        assert_eq!(session.targets().len(), 9);
        assert!(!session.can_finish());
        assert_eq!(session.samples_remaining(), 5);
    }

    #[test]
    fn test_state_progression() {
        let mut session = CalibrationSession::new(viewport());
        let ids: Vec<String> = session.targets().iter().map(|t| t.id.clone()).collect();
        let buffer = buffer_at(100.0, 100.0);

        for id in &ids[..4] {
            session.record_sample(id, &buffer).unwrap();
        }
        assert_eq!(session.state(), CalibrationState::Collecting);
        let err = session.finish().unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(session.state(), CalibrationState::Collecting);

        session.record_sample(&ids[4], &buffer).unwrap();
        assert_eq!(session.state(), CalibrationState::Ready);
        assert!(session.finish().is_ok());
        assert_eq!(session.state(), CalibrationState::Fitted);
    }

    #[test]
    fn test_finish_on_idle_rejected() {
        let mut session = CalibrationSession::new(viewport());
        assert!(session.finish().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn test_finish_twice_rejected() {
        let bias = AffineTransform::new(0.9, 0.0, 40.0, 0.0, 1.1, -30.0);
        let mut session = CalibrationSession::new(viewport());
        let ids: Vec<String> = session.targets().iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            let buffer = looking_at(&session, id, &bias);
            session.record_sample(id, &buffer).unwrap();
        }
        session.finish().unwrap();
        let err = session.finish().unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(err.to_string().contains("already fitted"), "{err}");

        let buffer = buffer_at(1.0, 1.0);
        assert!(session
            .record_sample(&ids[0], &buffer)
            .unwrap_err()
            .is_invalid_transition());
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let mut session = CalibrationSession::new(viewport());
        let empty = RawPointBuffer::default();
        assert!(session.record_sample("0.5-0.5", &empty).unwrap().is_none());
        assert!(session.samples().is_empty());
        assert_eq!(session.state(), CalibrationState::Idle);
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut session = CalibrationSession::new(viewport());
        let buffer = buffer_at(1.0, 1.0);
        let err = session.record_sample("0.3-0.3", &buffer).unwrap_err();
        assert!(matches!(err, GazeError::UnknownTarget { .. }));
        assert!(session.samples().is_empty());
    }

    #[test]
    fn test_averages_only_most_recent_points() {
        let mut session = CalibrationSession::new(viewport());
        let mut buffer = RawPointBuffer::default();
        // Old points far away, then 20 recent points around (300, 200).
        for i in 0..50 {
            buffer.push(RawPoint::new(5000.0, 5000.0, i as f64));
        }
        for i in 0..20 {
            let dx = if i % 2 == 0 { 10.0 } else { -10.0 };
            buffer.push(RawPoint::new(300.0 + dx, 200.0 - dx, 50.0 + i as f64));
        }

        let sample = session.record_sample("0.15-0.2", &buffer).unwrap().unwrap();
        assert!((sample.raw_average.x - 300.0).abs() < 1e-9);
        assert!((sample.raw_average.y - 200.0).abs() < 1e-9);
        assert_eq!(sample.target, Point2D::new(288.0, 216.0));
    }

    #[test]
    fn test_short_buffer_averages_what_it_has() {
        let mut session = CalibrationSession::new(viewport());
        let mut buffer = RawPointBuffer::default();
        buffer.push(RawPoint::new(10.0, 20.0, 0.0));
        buffer.push(RawPoint::new(20.0, 40.0, 1.0));
        let sample = session.record_sample("0.5-0.5", &buffer).unwrap().unwrap();
        assert_eq!(sample.raw_average, Point2D::new(15.0, 30.0));
    }

    #[test]
    fn test_visited_tracking() {
        let mut session = CalibrationSession::new(viewport());
        let buffer = buffer_at(1.0, 1.0);
        session.record_sample("0.85-0.8", &buffer).unwrap();
        assert!(session.is_visited("0.85-0.8"));
        assert!(!session.is_visited("0.15-0.2"));
    }

    #[test]
    fn test_fit_inverts_sensor_bias() {
        let bias = AffineTransform::new(0.95, 0.02, 35.0, -0.01, 1.05, -22.0);
        let mut session = CalibrationSession::new(viewport());
        let ids: Vec<String> = session.targets().iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            let buffer = looking_at(&session, id, &bias);
            session.record_sample(id, &buffer).unwrap();
        }

        let fit = session.finish().unwrap();
        assert_eq!(fit.outcome, FitOutcome::Solved);

        for target in session.targets() {
            let corrected = fit.transform.apply(bias.apply(target.position));
            assert!(corrected.distance_to(&target.position) < 1e-6);
        }
        assert_eq!(session.fit(), Some(&fit));
    }

    #[test]
    fn test_degenerate_samples_fit_identity() {
        // Five clicks on the same dot: enough samples, but singular.
        let mut session = CalibrationSession::new(viewport());
        let buffer = buffer_at(960.0, 540.0);
        for _ in 0..5 {
            session.record_sample("0.5-0.5", &buffer).unwrap();
        }
        let fit = session.finish().unwrap();
        assert_eq!(fit.outcome, FitOutcome::Singular);
        assert!(fit.transform.is_identity());
        assert_eq!(session.state(), CalibrationState::Fitted);
    }

    #[test]
    fn test_with_config_validates() {
        let config = TrackingDefaults {
            min_samples_to_finish: 2,
            ..Default::default()
        };
        assert!(CalibrationSession::with_config(viewport(), &config).is_err());

        let config = TrackingDefaults {
            capture_count: 5,
            min_samples_to_finish: 3,
            ..Default::default()
        };
        let session = CalibrationSession::with_config(viewport(), &config).unwrap();
        assert_eq!(session.capture_count(), 5);
        assert_eq!(session.samples_remaining(), 3);
    }
}
