//! Histogram generation for images
//!
//! Counts sample values of the channel of interest inside the region of
//! interest. Used by counting-sort based algorithms such as the watershed.

use super::Image;
use crate::error::{Error, Result};
use crate::pixel::Pixel;
use crate::roi::Roi;

/// Largest depth a histogram can be computed for
pub const MAX_HISTOGRAM_DEPTH: u32 = 16;

impl<T: Pixel> Image<T> {
    /// Get the histogram of the active channel over the effective ROI.
    ///
    /// The histogram has `2^depth` bins.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the image is signed or deeper than 16 bits ([`Error::UnsupportedDepth`])
    /// - the image has several channels and no COI ([`Error::NotSingleChannel`])
    /// - a sample does not fit in `depth` bits ([`Error::InvalidParameter`])
    ///
    /// # Example
    ///
    /// ```
    /// use camellia_core::Image;
    ///
    /// let image = Image::<u8>::new(10, 10).unwrap();
    /// let histo = image.histogram().unwrap();
    /// assert_eq!(histo.len(), 256);
    /// assert_eq!(histo[0], 100);
    /// ```
    pub fn histogram(&self) -> Result<Vec<u32>> {
        self.histogram_in(self.effective_roi())
    }

    /// Get the histogram of the active channel over `roi`.
    ///
    /// Same as [`Image::histogram`] with an explicit rectangle, which must
    /// lie inside the image ([`Error::RoiOutOfBounds`] otherwise).
    pub fn histogram_in(&self, roi: Roi) -> Result<Vec<u32>> {
        let depth = self.depth();
        if T::SIGNED || depth > MAX_HISTOGRAM_DEPTH {
            return Err(Error::UnsupportedDepth(depth));
        }
        if !roi.fits(self.width(), self.height()) {
            return Err(Error::RoiOutOfBounds {
                roi,
                width: self.width(),
                height: self.height(),
            });
        }
        let channel = self.active_channel()? as usize;
        let channels = self.channels() as usize;

        let mut histo = vec![0u32; 1usize << depth];
        for y in roi.y..roi.bottom() {
            let row = self.row(y);
            for x in roi.x..roi.right() {
                let v = row[x as usize * channels + channel].to_u32() as usize;
                let bin = histo.get_mut(v).ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "sample {v} at ({x}, {y}) exceeds {depth}-bit range"
                    ))
                })?;
                *bin += 1;
            }
        }
        Ok(histo)
    }
}
