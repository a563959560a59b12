//! Affine correction from sensor space to display space.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// A 2D affine map:
///
/// ```text
/// x' = a11·x + a12·y + b1
/// y' = a21·x + a22·y + b2
/// ```
///
/// With no fitted data the identity must be used; `Default` yields it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a11: f64,
    pub a12: f64,
    pub b1: f64,
    pub a21: f64,
    pub a22: f64,
    pub b2: f64,
}

impl AffineTransform {
    /// The identity transform `{1, 0, 0, 0, 1, 0}`.
    pub const IDENTITY: AffineTransform = AffineTransform {
        a11: 1.0,
        a12: 0.0,
        b1: 0.0,
        a21: 0.0,
        a22: 1.0,
        b2: 0.0,
    };

    pub fn new(a11: f64, a12: f64, b1: f64, a21: f64, a22: f64, b2: f64) -> Self {
        Self {
            a11,
            a12,
            b1,
            a21,
            a22,
            b2,
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D::new(
            self.a11 * p.x + self.a12 * p.y + self.b1,
            self.a21 * p.x + self.a22 * p.y + self.b2,
        )
    }

    /// Exact comparison against the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|c| c.is_finite())
    }

    /// Coefficients in `[a11, a12, b1, a21, a22, b2]` order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a11, self.a12, self.b1, self.a21, self.a22, self.b2]
    }

    /// Largest absolute coefficient difference to another transform.
    pub fn max_abs_diff(&self, other: &AffineTransform) -> f64 {
        self.coefficients()
            .iter()
            .zip(other.coefficients().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
