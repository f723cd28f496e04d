//! RLE decoding and run-domain point operations
//!
//! Reconstitutes rasters from run tables (run values or blob indices),
//! remaps and inverts run values, and uses a run table as a processing
//! mask over a raster.

use super::{NO_BLOB, RleImage, Run};
use crate::error::{RegionError, RegionResult};
use crate::raster::single_channel_mut;
use camellia_core::{ImageMut, Lut, Pixel};

/// Write `value_of(run)` for every run into the ROI of `dest`.
fn paint<T: Pixel>(
    rle: &RleImage,
    dest: &mut ImageMut<T>,
    value_of: impl Fn(&Run) -> u32,
) -> RegionResult<()> {
    let channel = single_channel_mut(dest)?;
    let roi = dest.effective_roi();
    if (roi.w, roi.h) != (rle.width(), rle.height()) {
        return Err(RegionError::DimensionMismatch {
            expected: (rle.width(), rle.height()),
            actual: (roi.w, roi.h),
        });
    }
    if rle.is_empty() {
        return Err(RegionError::EmptyImage);
    }

    let channels = dest.channels() as usize;
    for line in rle.lines() {
        let row = dest.row_mut(roi.y + line[0].line);
        let mut x = roi.x;
        for run in line {
            let value = T::saturating_from_u32(value_of(run));
            let end = (x + run.length).min(roi.right());
            for px in x..end {
                row[px as usize * channels + channel] = value;
            }
            x = end;
        }
    }
    Ok(())
}

/// Decode run values into the ROI of `dest`.
///
/// With a LUT, each run writes `lut[value]` (0 when out of range).
/// Values are clamped to the destination sample range.
///
/// # Errors
///
/// - [`RegionError::InvalidChannels`] for a multi-channel `dest` without COI
/// - [`RegionError::DimensionMismatch`] if the ROI size differs from the table
/// - [`RegionError::EmptyImage`] if the table holds no runs
pub fn decode<T: Pixel>(
    rle: &RleImage,
    dest: &mut ImageMut<T>,
    lut: Option<&Lut>,
) -> RegionResult<()> {
    match lut {
        Some(lut) => paint(rle, dest, |run| lut.lookup(run.value as usize)),
        None => paint(rle, dest, |run| run.value),
    }
}

/// Decode blob indices of a labeled table into the ROI of `dest`.
///
/// Without a LUT, blob `i` is written as `i + 1`; with a LUT, as `lut[i]`.
/// Background runs write 0.
///
/// # Errors
///
/// Same as [`decode`], plus [`RegionError::NotLabeled`] if the table has
/// not been through [`crate::labeling::label`].
pub fn decode_blobs<T: Pixel>(
    rle: &RleImage,
    dest: &mut ImageMut<T>,
    lut: Option<&Lut>,
) -> RegionResult<()> {
    if !rle.is_labeled() {
        return Err(RegionError::NotLabeled);
    }
    paint(rle, dest, |run| match (run.blob, lut) {
        (NO_BLOB, _) => 0,
        (blob, Some(lut)) => lut.lookup(blob),
        (blob, None) => u32::try_from(blob + 1).unwrap_or(u32::MAX),
    })
}

/// Remap run values through a LUT and join runs that become equal.
///
/// Values past the end of the LUT map to 0. The result is unlabeled and
/// keeps the source capacity.
///
/// # Errors
///
/// Returns [`RegionError::EmptyImage`] if `src` holds no runs.
pub fn apply_lut(src: &RleImage, lut: &Lut) -> RegionResult<RleImage> {
    if src.is_empty() {
        return Err(RegionError::EmptyImage);
    }
    let mut dest = RleImage::with_capacity(src.width(), src.height(), src.capacity())?;
    for run in src.runs() {
        dest.push_joined(lut.lookup(run.value as usize), run.length, run.line)?;
    }
    tracing::debug!(before = src.len(), after = dest.len(), "rle apply lut");
    Ok(dest)
}

/// Flip a binary classification in place: 0 becomes 1, anything else 0.
///
/// Every run's `blob` is reset to its own index and the table becomes
/// unlabeled, ready for another labeling pass (hole finding is
/// label, inverse, label). Runs are not joined, so inverting twice gives
/// back the original runs.
pub fn inverse(rle: &mut RleImage) {
    for (i, run) in rle.runs_mut().iter_mut().enumerate() {
        run.value = u32::from(run.value == 0);
        run.blob = i;
    }
    rle.set_labeled(false);
}

/// Use a run table as a processing mask.
///
/// Every pixel of the ROI of `image` covered by a run of value 0 is set to
/// `fill`; pixels under non-zero runs are left untouched.
///
/// # Errors
///
/// Same as [`decode`].
pub fn apply_mask<T: Pixel>(image: &mut ImageMut<T>, rle: &RleImage, fill: T) -> RegionResult<()> {
    let channel = single_channel_mut(image)?;
    let roi = image.effective_roi();
    if (roi.w, roi.h) != (rle.width(), rle.height()) {
        return Err(RegionError::DimensionMismatch {
            expected: (rle.width(), rle.height()),
            actual: (roi.w, roi.h),
        });
    }
    if rle.is_empty() {
        return Err(RegionError::EmptyImage);
    }

    let channels = image.channels() as usize;
    for line in rle.lines() {
        let row = image.row_mut(roi.y + line[0].line);
        let mut x = roi.x;
        for run in line {
            let end = (x + run.length).min(roi.right());
            if run.value == 0 {
                for px in x..end {
                    row[px as usize * channels + channel] = fill;
                }
            }
            x = end;
        }
    }
    Ok(())
}
