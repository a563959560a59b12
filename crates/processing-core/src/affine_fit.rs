//! Least-squares affine calibration fitting.
//!
//! `x'` and `y'` are fit as two independent regressions over the same
//! predictors `[x, y, 1]`, solved through the 3×3 normal equations:
//!
//! ```text
//! | Σx²  Σxy  Σx |   | a |   | Σx·x' |
//! | Σxy  Σy²  Σy | · | b | = | Σy·x' |
//! | Σx   Σy   N  |   | c |   | Σx'   |
//! ```
//!
//! Any degeneracy falls back to the identity for both axes; a fit never
//! returns a partially solved transform.

use serde::{Deserialize, Serialize};

use gazetile_model::affine::AffineTransform;
use gazetile_model::calibration::CalibrationSample;
use gazetile_model::geometry::Point2D;

/// Minimum number of correspondences needed to solve for six coefficients.
pub const MIN_POINTS: usize = 3;

/// Pivots with a smaller magnitude mark the system as singular.
pub const PIVOT_EPSILON: f64 = 1e-8;

/// How a fit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    /// Both systems solved; the transform is the least-squares solution.
    Solved,
    /// Fewer than [`MIN_POINTS`] pairs, or mismatched lengths. Identity returned.
    InsufficientData,
    /// Collinear or duplicated source points. Identity returned.
    Singular,
}

/// A fitted transform together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineFit {
    pub transform: AffineTransform,
    pub outcome: FitOutcome,
    /// Number of point pairs considered.
    pub points: usize,
    /// Root-mean-square residual in target units, when solved.
    pub rms_error: Option<f64>,
}

impl AffineFit {
    fn fallback(outcome: FitOutcome, points: usize) -> Self {
        Self {
            transform: AffineTransform::IDENTITY,
            outcome,
            points,
            rms_error: None,
        }
    }

    /// Whether the transform came from an actual solve.
    pub fn is_solved(&self) -> bool {
        self.outcome == FitOutcome::Solved
    }
}

/// Fit an affine transform mapping `source[i]` onto `target[i]`.
///
/// Returns the identity when the data cannot determine a transform.
pub fn fit_affine(source: &[Point2D], target: &[Point2D]) -> AffineTransform {
    fit_with_outcome(source, target).transform
}

/// Like [`fit_affine`], but reports whether the result was solved or a fallback.
pub fn fit_with_outcome(source: &[Point2D], target: &[Point2D]) -> AffineFit {
    let points = source.len();
    if points != target.len() || points < MIN_POINTS {
        tracing::debug!(
            source = points,
            target = target.len(),
            "Not enough calibration data, using identity"
        );
        return AffineFit::fallback(FitOutcome::InsufficientData, points);
    }

    let mut moments = [[0.0f64; 3]; 3];
    let mut rhs_x = [0.0f64; 3];
    let mut rhs_y = [0.0f64; 3];

    for (s, t) in source.iter().zip(target) {
        let row = [s.x, s.y, 1.0];
        for i in 0..3 {
            for j in 0..3 {
                moments[i][j] += row[i] * row[j];
            }
            rhs_x[i] += row[i] * t.x;
            rhs_y[i] += row[i] * t.y;
        }
    }

    let (Some(sol_x), Some(sol_y)) = (solve3x3(moments, rhs_x), solve3x3(moments, rhs_y)) else {
        tracing::warn!(points, "Calibration points are degenerate, using identity");
        return AffineFit::fallback(FitOutcome::Singular, points);
    };

    let transform = AffineTransform::new(sol_x[0], sol_x[1], sol_x[2], sol_y[0], sol_y[1], sol_y[2]);
    if !transform.is_finite() {
        tracing::warn!(points, "Calibration fit produced non-finite coefficients");
        return AffineFit::fallback(FitOutcome::Singular, points);
    }

    let rms_error = rms_residual(&transform, source, target);
    tracing::debug!(points, rms_error, "Affine calibration solved");

    AffineFit {
        transform,
        outcome: FitOutcome::Solved,
        points,
        rms_error: Some(rms_error),
    }
}

/// Fit from collected calibration samples (raw averages onto targets).
pub fn fit_samples(samples: &[CalibrationSample]) -> AffineFit {
    let source: Vec<Point2D> = samples.iter().map(|s| s.raw_average).collect();
    let target: Vec<Point2D> = samples.iter().map(|s| s.target).collect();
    fit_with_outcome(&source, &target)
}

/// Root-mean-square distance between `transform(source[i])` and `target[i]`.
pub fn rms_residual(transform: &AffineTransform, source: &[Point2D], target: &[Point2D]) -> f64 {
    let n = source.len().min(target.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = source
        .iter()
        .zip(target)
        .map(|(s, t)| {
            let p = transform.apply(*s);
            (p.x - t.x).powi(2) + (p.y - t.y).powi(2)
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}

/// Gauss-Jordan elimination without pivoting.
///
/// Returns `None` as soon as a pivot falls below [`PIVOT_EPSILON`].
fn solve3x3(mut m: [[f64; 3]; 3], mut v: [f64; 3]) -> Option<[f64; 3]> {
    for i in 0..3 {
        let pivot = m[i][i];
        if pivot.abs() < PIVOT_EPSILON {
            return None;
        }
        for j in i..3 {
            m[i][j] /= pivot;
        }
        v[i] /= pivot;

        for k in 0..3 {
            if k == i {
                continue;
            }
            let factor = m[k][i];
            for j in i..3 {
                m[k][j] -= factor * m[i][j];
            }
            v[k] -= factor * v[i];
        }
    }
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect()
    }

    fn map_all(t: &AffineTransform, source: &[Point2D]) -> Vec<Point2D> {
        source.iter().map(|p| t.apply(*p)).collect()
    }

    /// Nine calibration dots on a 1920×1080 display.
    fn pixel_grid() -> Vec<Point2D> {
        let mut out = Vec::new();
        for fy in [0.2, 0.5, 0.8] {
            for fx in [0.15, 0.5, 0.85] {
                out.push(Point2D::new((1920.0f64 * fx).round(), (1080.0f64 * fy).round()));
            }
        }
        out
    }

    #[test]
    fn test_too_few_points_is_identity() {
        let source = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        let fit = fit_with_outcome(&source, &source);
        assert_eq!(fit.transform, AffineTransform::IDENTITY);
        assert_eq!(fit.outcome, FitOutcome::InsufficientData);
        assert!(fit.rms_error.is_none());

        assert!(fit_affine(&[], &[]).is_identity());
    }

    #[test]
    fn test_mismatched_lengths_is_identity() {
        let source = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let target = pts(&[(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)]);
        let fit = fit_with_outcome(&source, &target);
        assert!(fit.transform.is_identity());
        assert_eq!(fit.outcome, FitOutcome::InsufficientData);
    }

    #[test]
    fn test_three_points_exact() {
        let truth = AffineTransform::new(1.2, -0.1, 15.0, 0.05, 0.9, -8.0);
        let source = pts(&[(100.0, 100.0), (900.0, 120.0), (400.0, 700.0)]);
        let target = map_all(&truth, &source);

        let fit = fit_with_outcome(&source, &target);
        assert!(fit.is_solved());
        assert!(fit.transform.max_abs_diff(&truth) < 1e-6);
        assert!(fit.rms_error.unwrap() < 1e-6);
    }

    #[test]
    fn test_pixel_grid_recovery() {
        let truth = AffineTransform::new(1.08, 0.03, -42.0, -0.02, 0.94, 27.5);
        let source = pixel_grid();
        let target = map_all(&truth, &source);

        let fitted = fit_affine(&source, &target);
        assert!(
            fitted.max_abs_diff(&truth) < 1e-6,
            "fitted {fitted:?} vs truth {truth:?}"
        );
    }

    #[test]
    fn test_collinear_is_identity() {
        let source = pts(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]);
        let target = pts(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        let fit = fit_with_outcome(&source, &target);
        assert!(fit.transform.is_identity());
        assert_eq!(fit.outcome, FitOutcome::Singular);
    }

    #[test]
    fn test_single_row_of_dots_is_identity() {
        // Only the top row of the grid was clicked.
        let source = pixel_grid()[..3].to_vec();
        let target = map_all(&AffineTransform::new(2.0, 0.0, 5.0, 0.0, 2.0, 5.0), &source);
        assert!(fit_affine(&source, &target).is_identity());
    }

    #[test]
    fn test_duplicate_points_is_identity() {
        let source = pts(&[(5.0, 5.0); 5]);
        let fit = fit_with_outcome(&source, &source);
        assert!(fit.transform.is_identity());
        assert_eq!(fit.outcome, FitOutcome::Singular);
    }

    #[test]
    fn test_noisy_points_minimize_error() {
        let truth = AffineTransform::new(1.0, 0.0, 20.0, 0.0, 1.0, -10.0);
        let source = pixel_grid();
        let noise = [
            (1.5, -0.5),
            (-1.0, 2.0),
            (0.5, 0.5),
            (-2.0, -1.0),
            (0.0, 1.5),
            (1.0, -2.0),
            (-0.5, 0.0),
            (2.0, 1.0),
            (-1.5, -1.5),
        ];
        let target: Vec<Point2D> = source
            .iter()
            .zip(noise)
            .map(|(p, (nx, ny))| {
                let q = truth.apply(*p);
                Point2D::new(q.x + nx, q.y + ny)
            })
            .collect();

        let fit = fit_with_outcome(&source, &target);
        assert!(fit.is_solved());
        let fitted_rms = fit.rms_error.unwrap();
        // The least-squares fit can only do better than the true transform.
        assert!(fitted_rms <= rms_residual(&truth, &source, &target) + 1e-9);
        assert!((fit.transform.b1 - 20.0).abs() < 3.0);
    }

    #[test]
    fn test_fit_samples_uses_raw_as_source() {
        let truth = AffineTransform::new(0.9, 0.0, 30.0, 0.0, 1.1, -20.0);
        let samples: Vec<CalibrationSample> = pixel_grid()
            .into_iter()
            .map(|raw| CalibrationSample::new(raw, truth.apply(raw)))
            .collect();
        let fit = fit_samples(&samples);
        assert!(fit.transform.max_abs_diff(&truth) < 1e-6);
        assert_eq!(fit.points, 9);
    }

    proptest! {
        #[test]
        fn recovers_known_transform(
            a11 in 0.5f64..2.0,
            a12 in -0.5f64..0.5,
            b1 in -300.0f64..300.0,
            a21 in -0.5f64..0.5,
            a22 in 0.5f64..2.0,
            b2 in -300.0f64..300.0,
            count in 4usize..=9,
        ) {
            let truth = AffineTransform::new(a11, a12, b1, a21, a22, b2);
            let source = pixel_grid()[..count].to_vec();
            let target = map_all(&truth, &source);

            let fit = fit_with_outcome(&source, &target);
            prop_assert!(fit.is_solved());
            prop_assert!(fit.transform.max_abs_diff(&truth) < 1e-6);
        }
    }
}
