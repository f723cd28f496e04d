//! Error types for camellia-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal implementation details.

use crate::roi::Roi;
use thiserror::Error;

/// Camellia core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Significant depth outside the storage type's range
    #[error("invalid pixel depth: {depth} bits (storage holds at most {max})")]
    InvalidDepth { depth: u32, max: u32 },

    /// Channel count outside 1..=4
    #[error("invalid channel count: {0}")]
    InvalidChannels(u32),

    /// Operation needs a single channel and the image has several without a COI
    #[error("{channels}-channel image without a channel of interest")]
    NotSingleChannel { channels: u32 },

    /// Channel index past the channel count
    #[error("channel {channel} out of range for {channels}-channel image")]
    ChannelOutOfRange { channel: u32, channels: u32 },

    /// ROI does not fit inside the image
    #[error("roi {roi:?} does not fit in {width}x{height} image")]
    RoiOutOfBounds { roi: Roi, width: u32, height: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Image dimension mismatch
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Raw buffer length does not match the geometry
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Unsupported pixel depth for this operation
    #[error("unsupported pixel depth: {0} bits")]
    UnsupportedDepth(u32),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for Camellia core operations
pub type Result<T> = std::result::Result<T, Error>;
