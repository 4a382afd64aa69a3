//! Error types for denoising and validation operations.
//!
//! Configuration violations and input contract violations fail fast.
//! Malformed timestamps are deliberately absent here: they degrade to a
//! fallback sampling rate instead (see [`crate::series::Sampling`]).

use thiserror::Error;

/// Everything that can go wrong while loading, denoising or validating a recording.
#[derive(Error, Debug)]
pub enum DenoiseError {
    /// Data violates a function's input contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage needs more samples than the series holds.
    #[error("Series too short: need at least {min} samples, got {actual}")]
    SeriesTooShort { min: usize, actual: usize },

    /// Time or acceleration columns disagree in length.
    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A filter parameter is out of range for the stage or the data's rate.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Savitzky–Golay least-squares solve failed.
    #[error("Linear algebra error: {0}")]
    LinalgError(String),

    /// A table row could not be parsed.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV reader/writer failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON configuration failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result.
pub type Result<T> = std::result::Result<T, DenoiseError>;

impl DenoiseError {
    /// [`DenoiseError::InvalidInput`] from any message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// [`DenoiseError::SeriesTooShort`] for a stage needing `min` samples.
    #[must_use]
    pub const fn series_too_short(min: usize, actual: usize) -> Self {
        Self::SeriesTooShort { min, actual }
    }

    /// [`DenoiseError::LengthMismatch`] against the reference column length.
    #[must_use]
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// [`DenoiseError::InvalidConfig`] from any message.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// [`DenoiseError::LinalgError`]; accepts the nalgebra error string directly.
    #[must_use]
    pub fn linalg(msg: impl Into<String>) -> Self {
        Self::LinalgError(msg.into())
    }

    /// Create a parse error for a 1-based data row.
    #[must_use]
    pub fn parse(row: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            row,
            message: message.into(),
        }
    }

    /// Whether this error is a configuration violation.
    #[must_use]
    pub const fn is_config_violation(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}
