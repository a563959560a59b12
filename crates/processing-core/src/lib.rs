//! GazeTile Processing Core
//!
//! Turns raw point-of-regard estimates into a stable, calibrated target:
//! - **Smoothing:** Streaming EMA that damps per-sample jitter
//! - **Affine fitting:** Least-squares correction of sensor bias and scale
//! - **Hit resolution:** Coordinate to tile, via nearest tagged ancestor
//! - **Calibration:** Sample collection against nine fixed targets
//! - **Ring buffer:** Bounded history of recent raw points
//!
//! This crate is pure computation: no I/O, no sensor or UI dependencies.
//! All inputs are data; all outputs are data.

pub mod affine_fit;
pub mod calibration;
pub mod ring_buffer;
pub mod scene;
pub mod smoother;

pub use affine_fit::{fit_affine, fit_with_outcome, AffineFit, FitOutcome};
pub use calibration::{CalibrationSession, CalibrationState};
pub use hit_test::{resolve, HitResult, SceneQuery, TaggableElement};
pub use ring_buffer::{RawPointBuffer, RingBuffer};
pub use scene::SceneGraph;
pub use smoother::EmaSmoother;
