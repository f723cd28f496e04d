//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Value comparison failed
    #[error(
        "value comparison failed at index {index}: expected {expected}, got {actual}, delta {delta}"
    )]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        delta: f64,
    },

    /// Image geometries differ
    #[error("image comparison failed at index {index}: {expected:?} vs {actual:?} (w, h, channels)")]
    ImageDimensionMismatch {
        index: usize,
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },

    /// Image samples differ
    #[error("image comparison failed at index {index}: first difference at ({x}, {y})")]
    ImageMismatch { index: usize, x: u32, y: u32 },

    /// Sequence comparison failed
    #[error("sequence comparison failed at index {index}: first difference at position {position}")]
    SequenceMismatch { index: usize, position: usize },

    /// Boolean check failed
    #[error("check failed at index {index}: {what}")]
    CheckFailed { index: usize, what: String },

    /// Invalid generator parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] camellia_core::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
