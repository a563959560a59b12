//! GazeTile Common Utilities
//!
//! Shared infrastructure for all GazeTile crates:
//! - Error types and result aliases
//! - Session clock for stamping raw sensor points
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
