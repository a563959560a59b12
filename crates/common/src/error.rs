//! Error types shared across GazeTile crates.

/// Top-level error type for GazeTile operations.
///
/// Numeric degradations (too few calibration samples, singular systems,
/// corrupt stored calibration) never surface here; they fall back to the
/// identity transform instead. Only caller mistakes are reported.
#[derive(Debug, thiserror::Error)]
pub enum GazeError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid transition: {message}")]
    InvalidTransition { message: String },

    #[error("Unknown calibration target: {id}")]
    UnknownTarget { id: String },

    #[error("Sensor error: {message}")]
    Sensor { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GazeError.
pub type GazeResult<T> = Result<T, GazeError>;

impl GazeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: msg.into(),
        }
    }

    pub fn unknown_target(id: impl Into<String>) -> Self {
        Self::UnknownTarget { id: id.into() }
    }

    pub fn sensor(msg: impl Into<String>) -> Self {
        Self::Sensor {
            message: msg.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }

    /// Whether this error was caused by calling an operation in the wrong state.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
