//! Camellia Core - Basic data structures for image processing
//!
//! This crate provides the fundamental data structures used throughout
//! the Camellia image processing library:
//!
//! - [`Image`] / [`ImageMut`] - The raster container (immutable / mutable)
//! - [`Pixel`] - Integer sample types (`u8`, `u16`, `u32`, `i8`, `i16`, `i32`)
//! - [`Roi`] - Rectangular regions of interest
//! - [`Lut`] - Lookup tables

pub mod error;
pub mod image;
pub mod lut;
pub mod pixel;
pub mod roi;

pub use error::{Error, Result};
pub use image::{Image, ImageMut, MAX_CHANNELS, MAX_HISTOGRAM_DEPTH};
pub use lut::Lut;
pub use pixel::Pixel;
pub use roi::Roi;
