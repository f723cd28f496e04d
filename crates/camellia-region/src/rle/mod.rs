//! Run-length encoded images
//!
//! An [`RleImage`] stores a classified raster as maximal horizontal runs of
//! equal value, scanline by scanline. It is the input of the run-based
//! labeling in [`crate::labeling`] and of the run-domain operators in this
//! module's submodules.
//!
//! # Run table layout
//!
//! - Runs are stored line by line, top to bottom
//! - On each line, runs are contiguous, ordered left to right, and their
//!   lengths sum to the table width
//! - `Run::blob` holds the run's own index after encoding, a union-find
//!   parent during labeling, and the dense blob index afterwards
//!   ([`NO_BLOB`] for background runs)
//!
//! # Capacity
//!
//! The table refuses to hold more than [`RleImage::capacity`] runs. An
//! operation that overflows clears the table, doubles the capacity so a
//! retry has more room, and returns [`RegionError::RunCapacityExceeded`].

mod decode;
mod encode;
mod morph;

pub use decode::{apply_lut, apply_mask, decode, decode_blobs, inverse};
pub use encode::{Classifier, ColorClusters, encode, encode_color};
pub use morph::{StructuringElement, erode};

use crate::error::{RegionError, RegionResult};

/// Blob index of a background run after labeling
pub const NO_BLOB: usize = usize::MAX;

/// A maximal horizontal span of equal-valued pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Class value shared by every pixel of the run
    pub value: u32,
    /// Number of pixels
    pub length: u32,
    /// Own index, union-find parent, or dense blob index (see module docs)
    pub blob: usize,
    /// Scanline
    pub line: u32,
}

/// A run-length encoded image
#[derive(Debug, Clone)]
pub struct RleImage {
    width: u32,
    height: u32,
    runs: Vec<Run>,
    capacity: usize,
    labeled: bool,
}

impl RleImage {
    /// Create an empty run table for a `width` x `height` image.
    ///
    /// The capacity is large enough for any image of that size
    /// (`width * height + 2` runs).
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::EmptyImage`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> RegionResult<Self> {
        let capacity = (width as usize)
            .saturating_mul(height as usize)
            .saturating_add(2);
        Self::with_capacity(width, height, capacity)
    }

    /// Create an empty run table holding at most `capacity` runs.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::EmptyImage`] if width or height is 0, and
    /// [`RegionError::InvalidParameters`] if `capacity` is 0.
    pub fn with_capacity(width: u32, height: u32, capacity: usize) -> RegionResult<Self> {
        if width == 0 || height == 0 {
            return Err(RegionError::EmptyImage);
        }
        if capacity == 0 {
            return Err(RegionError::InvalidParameters(
                "run table capacity must be positive".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            runs: Vec::new(),
            capacity,
            labeled: false,
        })
    }

    /// Width of the encoded image.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the encoded image.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Maximum number of runs the table may hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of runs.
    #[inline]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the table holds no runs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The runs, line by line.
    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Whether `blob` fields hold dense blob indices.
    #[inline]
    pub fn is_labeled(&self) -> bool {
        self.labeled
    }

    /// Iterate over the runs of each line, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = &[Run]> {
        self.runs.chunk_by(|a, b| a.line == b.line)
    }

    /// Index of the first run of every line, plus the run count.
    ///
    /// `starts[y]..starts[y + 1]` are the indices of line `y`.
    pub fn line_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.height as usize + 1);
        let mut i = 0;
        for y in 0..self.height {
            starts.push(i);
            while i < self.runs.len() && self.runs[i].line == y {
                i += 1;
            }
        }
        starts.push(self.runs.len());
        starts
    }

    /// Check the run invariants.
    ///
    /// Every line has runs, runs of a line are maximal (no two neighbours
    /// share a value), and their lengths sum to the width.
    pub fn is_well_formed(&self) -> bool {
        let mut count = 0u32;
        for (y, line) in self.lines().enumerate() {
            if line[0].line as usize != y {
                return false;
            }
            let total: u64 = line.iter().map(|r| u64::from(r.length)).sum();
            let maximal = line.windows(2).all(|w| w[0].value != w[1].value);
            if total != u64::from(self.width) || !maximal || line.iter().any(|r| r.length == 0) {
                return false;
            }
            count += 1;
        }
        count == self.height
    }

    /// Number of pixels covered by runs of non-zero value.
    pub fn foreground_area(&self) -> u64 {
        self.runs
            .iter()
            .filter(|r| r.value != 0)
            .map(|r| u64::from(r.length))
            .sum()
    }

    /// Clear the table for a new `width` x `height` encoding.
    pub(crate) fn begin(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.runs.clear();
        self.labeled = false;
    }

    /// Append a run, merging it into the previous run when it continues it.
    ///
    /// A new run gets its own index as `blob`.
    pub(crate) fn push_joined(&mut self, value: u32, length: u32, line: u32) -> RegionResult<()> {
        if let Some(last) = self.runs.last_mut() {
            if last.line == line && last.value == value {
                last.length += length;
                return Ok(());
            }
        }
        if self.runs.len() >= self.capacity {
            return Err(self.overflow());
        }
        let blob = self.runs.len();
        self.runs.push(Run {
            value,
            length,
            blob,
            line,
        });
        Ok(())
    }

    /// Drop the partial output and grow the capacity for a retry.
    fn overflow(&mut self) -> RegionError {
        let capacity = self.capacity;
        self.runs.clear();
        self.labeled = false;
        self.capacity = capacity.saturating_mul(2);
        tracing::warn!(
            capacity,
            new_capacity = self.capacity,
            "run table overflow, capacity doubled"
        );
        RegionError::RunCapacityExceeded { capacity }
    }

    pub(crate) fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub(crate) fn set_labeled(&mut self, labeled: bool) {
        self.labeled = labeled;
    }
}
