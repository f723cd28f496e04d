//! Precondition checks shared by the raster-facing operations

use crate::error::{RegionError, RegionResult};
use camellia_core::{Image, ImageMut, Pixel};

/// Deepest unsigned depth the classifying and flooding operations accept
pub(crate) const MAX_CLASSIFY_DEPTH: u32 = 16;

/// Resolve the channel a single-channel operation reads.
pub(crate) fn single_channel<T: Pixel>(image: &Image<T>) -> RegionResult<usize> {
    image
        .active_channel()
        .map(|c| c as usize)
        .map_err(|_| RegionError::InvalidChannels {
            expected: "1 or a channel of interest",
            actual: image.channels(),
        })
}

/// Same as [`single_channel`] for a mutable destination.
pub(crate) fn single_channel_mut<T: Pixel>(image: &ImageMut<T>) -> RegionResult<usize> {
    image
        .active_channel()
        .map(|c| c as usize)
        .map_err(|_| RegionError::InvalidChannels {
            expected: "1 or a channel of interest",
            actual: image.channels(),
        })
}

/// Require an unsigned source of at most 16 significant bits.
pub(crate) fn check_unsigned_depth<T: Pixel>(image: &Image<T>) -> RegionResult<()> {
    if T::SIGNED || image.depth() > MAX_CLASSIFY_DEPTH {
        return Err(RegionError::UnsupportedDepth {
            expected: "unsigned, 1 to 16 bits",
            actual: image.depth(),
        });
    }
    Ok(())
}
