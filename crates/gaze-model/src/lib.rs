//! GazeTile Data Model
//!
//! Defines the core data contracts shared by the processing pipeline:
//! - **Points:** Sensor readings and raw points stamped on arrival
//! - **Geometry:** Display-space points, rectangles, and viewport size
//! - **Affine:** The correction applied to every raw point
//! - **Calibration:** Fixed targets and collected samples
//!
//! Coordinates are display pixels; the sensor is assumed to report in
//! roughly the same space, which the affine correction then refines.

pub mod affine;
pub mod calibration;
pub mod geometry;
pub mod point;

pub use affine::*;
pub use calibration::*;
pub use geometry::*;
pub use point::*;
