//! Camellia - Run-length image analysis for Rust
//!
//! This is a Rust port of the Camellia image processing library's region
//! analysis: run-length encoding, connected components and blob analysis
//! computed on runs, and a hierarchical watershed.
//!
//! # Overview
//!
//! - Images with region and channel of interest ([`Image`], [`ImageMut`])
//! - RLE encoding, decoding, LUT remapping, masking and erosion on runs
//! - Union-find run labeling and blob statistics
//! - Hierarchical watershed with a basin dendrogram and pruning
//!
//! # Example
//!
//! ```
//! use camellia::region::{Classifier, RleImage, encode, label};
//! use camellia::{Image, ImageMut, Roi};
//!
//! let mut image = ImageMut::<u8>::new(32, 32).unwrap();
//! image.set_in_rect(Roi::new_unchecked(4, 4, 8, 8), 255).unwrap();
//! let image: Image<u8> = image.into();
//!
//! let mut rle = RleImage::new(32, 32).unwrap();
//! encode(&image, Classifier::Threshold(128), &mut rle).unwrap();
//! let blobs = label(&mut rle).unwrap();
//! assert_eq!(blobs[0].surface, 64);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use camellia_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use camellia_region as region;
