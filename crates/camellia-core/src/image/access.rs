//! Pixel access functions
//!
//! Low-level functions for getting and setting individual samples.
//! `get_pixel` / `set_pixel` address the channel of interest (channel 0 for
//! single-channel images); `get_sample` / `set_sample` address any channel.

use super::{Image, ImageData, ImageMut};
use crate::error::{Error, Result};
use crate::pixel::Pixel;
use crate::roi::Roi;

impl<T: Pixel> ImageData<T> {
    #[inline]
    fn index(&self, x: u32, y: u32, channel: u32) -> Option<usize> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        Some(y as usize * self.stride() + x as usize * self.channels as usize + channel as usize)
    }

    #[inline]
    fn pixel_channel(&self) -> u32 {
        self.coi.unwrap_or(0)
    }

    fn row(&self, y: u32) -> &[T] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }
}

impl<T: Pixel> Image<T> {
    /// Get the sample of the channel of interest at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<T> {
        self.get_sample(x, y, self.inner.pixel_channel())
    }

    /// Get the sample of `channel` at (x, y).
    ///
    /// Returns `None` if coordinates or channel are out of bounds.
    pub fn get_sample(&self, x: u32, y: u32, channel: u32) -> Option<T> {
        self.inner
            .index(x, y, channel)
            .map(|i| self.inner.data[i])
    }

    /// Get the samples of row `y`, channels interleaved.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        self.inner.row(y)
    }
}

impl<T: Pixel> ImageMut<T> {
    /// Get the sample of the channel of interest at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<T> {
        self.get_sample(x, y, self.inner.pixel_channel())
    }

    /// Get the sample of `channel` at (x, y).
    pub fn get_sample(&self, x: u32, y: u32, channel: u32) -> Option<T> {
        self.inner
            .index(x, y, channel)
            .map(|i| self.inner.data[i])
    }

    /// Set the sample of the channel of interest at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: T) -> Result<()> {
        let channel = self.inner.pixel_channel();
        self.set_sample(x, y, channel, value)
    }

    /// Set the sample of `channel` at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates or channel are out
    /// of bounds.
    pub fn set_sample(&mut self, x: u32, y: u32, channel: u32, value: T) -> Result<()> {
        let len = self.inner.data.len();
        let i = self
            .inner
            .index(x, y, channel)
            .ok_or(Error::IndexOutOfBounds {
                index: y as usize * self.inner.stride() + x as usize,
                len,
            })?;
        self.inner.data[i] = value;
        Ok(())
    }

    /// Get the samples of row `y`, channels interleaved.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        self.inner.row(y)
    }

    /// Get the mutable samples of row `y`, channels interleaved.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        let stride = self.inner.stride();
        let start = y as usize * stride;
        &mut self.inner.data[start..start + stride]
    }

    /// Set every pixel of `rect` to `value`.
    ///
    /// Writes the channel of interest only when one is set, every channel
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if `rect` does not fit in the image.
    pub fn set_in_rect(&mut self, rect: Roi, value: T) -> Result<()> {
        if !rect.fits(self.inner.width, self.inner.height) {
            return Err(Error::RoiOutOfBounds {
                roi: rect,
                width: self.inner.width,
                height: self.inner.height,
            });
        }
        let channels = self.inner.channels as usize;
        let coi = self.inner.coi;
        for y in rect.y..rect.bottom() {
            let row = self.row_mut(y);
            let span = &mut row[rect.x as usize * channels..rect.right() as usize * channels];
            match coi {
                Some(c) => span
                    .iter_mut()
                    .skip(c as usize)
                    .step_by(channels)
                    .for_each(|s| *s = value),
                None => span.fill(value),
            }
        }
        Ok(())
    }
}
