//! Calibration targets and the samples collected against them.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2D, ViewportSize};

/// Horizontal target positions as fractions of the viewport width.
pub const TARGET_FRACTIONS_X: [f64; 3] = [0.15, 0.5, 0.85];

/// Vertical target positions as fractions of the viewport height.
pub const TARGET_FRACTIONS_Y: [f64; 3] = [0.2, 0.5, 0.8];

/// A fixed on-screen position the user looks at while a sample is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    /// Stable identifier, `"{fx}-{fy}"` (e.g. `"0.15-0.2"`).
    pub id: String,
    /// Pixel position on screen.
    pub position: Point2D,
}

impl CalibrationTarget {
    /// The nine targets of the 3×3 grid, row-major from the top-left.
    pub fn standard_grid(viewport: ViewportSize) -> Vec<CalibrationTarget> {
        TARGET_FRACTIONS_Y
            .iter()
            .flat_map(|&fy| {
                TARGET_FRACTIONS_X.iter().map(move |&fx| CalibrationTarget {
                    id: format!("{fx}-{fy}"),
                    position: viewport.at_fraction(fx, fy),
                })
            })
            .collect()
    }
}

/// One correspondence between an averaged sensor reading and a known target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Mean of the raw sensor points captured for this sample.
    pub raw_average: Point2D,
    /// Where the target was on screen.
    pub target: Point2D,
    /// Which target this sample was taken against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl CalibrationSample {
    pub fn new(raw_average: Point2D, target: Point2D) -> Self {
        Self {
            raw_average,
            target,
            target_id: None,
        }
    }
}
