//! Error types for camellia-region

use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] camellia_core::Error),

    /// Unsupported pixel depth for this operation
    #[error("unsupported depth: expected {expected}, got {actual}")]
    UnsupportedDepth { expected: &'static str, actual: u32 },

    /// Wrong channel count for this operation
    #[error("invalid channel count: expected {expected}, got {actual}")]
    InvalidChannels { expected: &'static str, actual: u32 },

    /// Source and destination geometries disagree
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The run table needs a labeling pass first
    #[error("run table is not labeled")]
    NotLabeled,

    /// Blob index past the blob table
    #[error("blob {index} out of range ({count} blobs)")]
    InvalidBlob { index: usize, count: usize },

    /// Empty image
    #[error("empty image: no pixels to process")]
    EmptyImage,

    /// Encoding or erosion produced more runs than the table can hold
    #[error("run table capacity exceeded: {capacity} runs")]
    RunCapacityExceeded { capacity: usize },

    /// Labeling found more blobs than the blob table can hold
    #[error("too many blobs: capacity is {capacity}")]
    TooManyBlobs { capacity: usize },

    /// Pixel labeling ran out of labels
    #[error("too many labels: capacity is {capacity}")]
    TooManyLabels { capacity: usize },

    /// Watershed basin count no longer fits the signed output raster
    #[error("too many basins: {count} exceeds {max}")]
    BasinCapacityExceeded { count: usize, max: usize },

    /// Growing a table failed
    #[error("allocation failed while growing {0}")]
    AllocationFailed(&'static str),
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
