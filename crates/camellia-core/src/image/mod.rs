//! Image - The raster container
//!
//! `Image<T>` is the raster type consumed and produced by every algorithm
//! in the workspace. It is generic over the sample type `T` (see
//! [`Pixel`]), so one algorithm body serves all supported depths.
//!
//! # Pixel layout
//!
//! - One sample of type `T` per channel, channels interleaved
//! - Rows are contiguous; the row stride is `width * channels` samples
//! - `depth` is the number of significant bits, at most `T::BITS`
//!
//! # Region and channel of interest
//!
//! An optional [`Roi`] restricts processing to a sub-rectangle and an
//! optional channel of interest (COI) selects one channel of a
//! multi-channel image for single-channel algorithms.
//!
//! # Ownership model
//!
//! `Image` uses `Arc` for cheap cloning (shared ownership).
//! To modify pixel data, convert to `ImageMut` via [`Image::try_into_mut`]
//! or [`Image::to_mut`], then convert back with `Into<Image>`.

mod access;
mod histogram;

pub use histogram::MAX_HISTOGRAM_DEPTH;

use crate::error::{Error, Result};
use crate::pixel::Pixel;
use crate::roi::Roi;
use std::sync::Arc;

/// Maximum number of interleaved channels
pub const MAX_CHANNELS: u32 = 4;

/// Internal image data
#[derive(Debug, Clone)]
struct ImageData<T: Pixel> {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Interleaved channels per pixel (1..=4)
    channels: u32,
    /// Significant bits per sample
    depth: u32,
    /// Optional region of interest
    roi: Option<Roi>,
    /// Optional channel of interest
    coi: Option<u32>,
    /// Samples, row-major, channels interleaved
    data: Vec<T>,
}

impl<T: Pixel> ImageData<T> {
    fn new(width: u32, height: u32, channels: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(Error::InvalidChannels(channels));
        }
        let len = sample_count(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            depth: T::BITS,
            roi: None,
            coi: None,
            data: vec![T::default(); len],
        })
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    fn active_channel(&self) -> Result<u32> {
        match self.coi {
            Some(c) => Ok(c),
            None if self.channels == 1 => Ok(0),
            None => Err(Error::NotSingleChannel {
                channels: self.channels,
            }),
        }
    }

    fn effective_roi(&self) -> Roi {
        self.roi
            .unwrap_or_else(|| Roi::full(self.width, self.height))
    }
}

fn sample_count(width: u32, height: u32, channels: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels as usize))
        .ok_or(Error::InvalidDimension { width, height })
}

/// Image - Main raster container
///
/// Cheap to clone: clones share the sample buffer.
///
/// # Examples
///
/// ```
/// use camellia_core::Image;
///
/// // Create a new 8-bit grayscale image
/// let image = Image::<u8>::new(640, 480).unwrap();
/// assert_eq!(image.width(), 640);
/// assert_eq!(image.height(), 480);
/// assert_eq!(image.depth(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct Image<T: Pixel> {
    inner: Arc<ImageData<T>>,
}

impl<T: Pixel> Image<T> {
    /// Create a new single-channel image, initialized to zero.
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels (must be > 0)
    /// * `height` - Height in pixels (must be > 0)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_with_channels(width, height, 1)
    }

    /// Create a new image with `channels` interleaved channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0, or
    /// [`Error::InvalidChannels`] if `channels` is not in 1..=4.
    pub fn new_with_channels(width: u32, height: u32, channels: u32) -> Result<Self> {
        Ok(Image {
            inner: Arc::new(ImageData::new(width, height, channels)?),
        })
    }

    /// Wrap an existing sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSizeMismatch`] if `data` does not hold exactly
    /// `width * height * channels` samples.
    pub fn from_vec(width: u32, height: u32, channels: u32, data: Vec<T>) -> Result<Self> {
        let mut inner = ImageData::new(width, height, channels)?;
        if data.len() != inner.data.len() {
            return Err(Error::BufferSizeMismatch {
                expected: inner.data.len(),
                actual: data.len(),
            });
        }
        inner.data = data;
        Ok(Image {
            inner: Arc::new(inner),
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> u32 {
        self.inner.channels
    }

    /// Get the number of significant bits per sample.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Whether samples are signed.
    #[inline]
    pub fn is_signed(&self) -> bool {
        T::SIGNED
    }

    /// Get the row stride in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.inner.stride()
    }

    /// Get the region of interest, if any.
    #[inline]
    pub fn roi(&self) -> Option<Roi> {
        self.inner.roi
    }

    /// Get the channel of interest, if any.
    #[inline]
    pub fn coi(&self) -> Option<u32> {
        self.inner.coi
    }

    /// The region an operation should process: the ROI, or the whole image.
    #[inline]
    pub fn effective_roi(&self) -> Roi {
        self.inner.effective_roi()
    }

    /// The channel a single-channel operation should read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSingleChannel`] for a multi-channel image with
    /// no channel of interest.
    pub fn active_channel(&self) -> Result<u32> {
        self.inner.active_channel()
    }

    /// Get raw access to the samples.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.inner.data
    }

    /// Get the number of strong references to this image.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Create a zeroed image with the same geometry, depth, ROI and COI.
    pub fn create_template(&self) -> Self {
        let inner = ImageData {
            data: vec![T::default(); self.inner.data.len()],
            ..(*self.inner).clone_header()
        };
        Image {
            inner: Arc::new(inner),
        }
    }

    /// Check if two images have the same width, height and channel count.
    pub fn sizes_equal<U: Pixel>(&self, other: &Image<U>) -> bool {
        self.inner.width == other.inner.width
            && self.inner.height == other.inner.height
            && self.inner.channels == other.inner.channels
    }

    /// Create a deep copy of this image.
    pub fn deep_clone(&self) -> Self {
        Image {
            inner: Arc::new((*self.inner).clone()),
        }
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<ImageMut<T>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(ImageMut { inner: data }),
            Err(arc) => Err(Image { inner: arc }),
        }
    }

    /// Create a mutable copy of this image.
    pub fn to_mut(&self) -> ImageMut<T> {
        ImageMut {
            inner: (*self.inner).clone(),
        }
    }
}

impl<T: Pixel> ImageData<T> {
    /// Copy of the header with an empty buffer.
    fn clone_header(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            depth: self.depth,
            roi: self.roi,
            coi: self.coi,
            data: Vec::new(),
        }
    }
}

/// Mutable image
///
/// Allows modification of image data and metadata. Convert back to an
/// immutable [`Image`] using `Into<Image>`.
#[derive(Debug)]
pub struct ImageMut<T: Pixel> {
    inner: ImageData<T>,
}

impl<T: Pixel> ImageMut<T> {
    /// Create a new single-channel mutable image, initialized to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(ImageMut {
            inner: ImageData::new(width, height, 1)?,
        })
    }

    /// Create a new mutable image with `channels` interleaved channels.
    ///
    /// # Errors
    ///
    /// See [`Image::new_with_channels`].
    pub fn new_with_channels(width: u32, height: u32, channels: u32) -> Result<Self> {
        Ok(ImageMut {
            inner: ImageData::new(width, height, channels)?,
        })
    }

    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> u32 {
        self.inner.channels
    }

    /// Get the number of significant bits per sample.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Get the row stride in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.inner.stride()
    }

    /// Get the region of interest, if any.
    #[inline]
    pub fn roi(&self) -> Option<Roi> {
        self.inner.roi
    }

    /// Get the channel of interest, if any.
    #[inline]
    pub fn coi(&self) -> Option<u32> {
        self.inner.coi
    }

    /// See [`Image::effective_roi`].
    #[inline]
    pub fn effective_roi(&self) -> Roi {
        self.inner.effective_roi()
    }

    /// See [`Image::active_channel`].
    pub fn active_channel(&self) -> Result<u32> {
        self.inner.active_channel()
    }

    /// Set the number of significant bits per sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] unless `1 <= depth <= T::BITS`.
    pub fn set_depth(&mut self, depth: u32) -> Result<()> {
        if depth == 0 || depth > T::BITS {
            return Err(Error::InvalidDepth {
                depth,
                max: T::BITS,
            });
        }
        self.inner.depth = depth;
        Ok(())
    }

    /// Set or clear the region of interest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if the ROI is empty or does not fit.
    pub fn set_roi(&mut self, roi: Option<Roi>) -> Result<()> {
        if let Some(r) = roi {
            if !r.fits(self.inner.width, self.inner.height) {
                return Err(Error::RoiOutOfBounds {
                    roi: r,
                    width: self.inner.width,
                    height: self.inner.height,
                });
            }
        }
        self.inner.roi = roi;
        Ok(())
    }

    /// Set or clear the channel of interest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelOutOfRange`] if the channel does not exist.
    pub fn set_coi(&mut self, coi: Option<u32>) -> Result<()> {
        if let Some(c) = coi {
            if c >= self.inner.channels {
                return Err(Error::ChannelOutOfRange {
                    channel: c,
                    channels: self.inner.channels,
                });
            }
        }
        self.inner.coi = coi;
        Ok(())
    }

    /// Get raw access to the samples.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.inner.data
    }

    /// Get mutable raw access to the samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.inner.data
    }

    /// Set every sample of every channel to `value`.
    pub fn fill(&mut self, value: T) {
        self.inner.data.fill(value);
    }

    /// Set every sample to zero.
    pub fn clear(&mut self) {
        self.fill(T::default());
    }
}

impl<T: Pixel> From<ImageMut<T>> for Image<T> {
    fn from(image_mut: ImageMut<T>) -> Self {
        Image {
            inner: Arc::new(image_mut.inner),
        }
    }
}
