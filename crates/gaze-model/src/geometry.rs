//! Screen geometry: points, rectangles, and viewport dimensions.
//!
//! All coordinates are in display pixels with `(0, 0)` at the top-left
//! of the viewport.

use serde::{Deserialize, Serialize};

/// A 2D point in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Arithmetic mean of a set of points. `None` for an empty input.
    pub fn mean<I>(points: I) -> Option<Point2D>
    where
        I: IntoIterator<Item = Point2D>,
    {
        let (count, sum_x, sum_y) = points
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, sx, sy), p| (n + 1, sx + p.x, sy + p.y));
        if count == 0 {
            return None;
        }
        Some(Point2D::new(sum_x / count as f64, sum_y / count as f64))
    }
}

/// An axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Whether the point lies inside, edges inclusive on the top-left and
    /// exclusive on the bottom-right so adjacent rectangles never both match.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Shrink by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.left + amount,
            self.top + amount,
            self.width - 2.0 * amount,
            self.height - 2.0 * amount,
        )
    }
}

/// Dimensions of the display viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The full viewport as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Pixel position for fractional coordinates, rounded to whole pixels.
    pub fn at_fraction(&self, fx: f64, fy: f64) -> Point2D {
        Point2D::new((self.width * fx).round(), (self.height * fy).round())
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}
