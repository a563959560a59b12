//! Gaze jitter smoothing.
//!
//! A streaming exponential moving average over both axes. The first sample
//! after construction or [`EmaSmoother::reset`] seeds the filter and passes
//! through unchanged, so a freshly started session shows no lag.

use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::geometry::Point2D;

/// Default weight of the newest sample.
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Streaming 2D EMA smoother.
///
/// `smoothed = alpha * current + (1 - alpha) * previous`
#[derive(Debug, Clone)]
pub struct EmaSmoother {
    alpha: f64,
    last: Option<Point2D>,
}

impl EmaSmoother {
    /// Create a smoother with the given alpha in `(0, 1]`.
    pub fn new(alpha: f64) -> GazeResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(GazeError::config(format!(
                "smoothing alpha must be in (0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha, last: None })
    }

    /// Feed a sample and return the smoothed position.
    pub fn next(&mut self, x: f64, y: f64) -> Point2D {
        let smoothed = match self.last {
            None => Point2D::new(x, y),
            Some(prev) => Point2D::new(
                self.alpha * x + (1.0 - self.alpha) * prev.x,
                self.alpha * y + (1.0 - self.alpha) * prev.y,
            ),
        };
        self.last = Some(smoothed);
        smoothed
    }

    /// Forget the filter state; the next sample re-seeds.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The most recent smoothed output, if seeded.
    pub fn current(&self) -> Option<Point2D> {
        self.last
    }
}

impl Default for EmaSmoother {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            last: None,
        }
    }
}
