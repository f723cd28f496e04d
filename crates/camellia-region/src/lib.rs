//! camellia-region - Run-length region analysis for Camellia
//!
//! This crate provides region processing functionality including:
//!
//! - **RLE encoding** - Classifying a raster into a table of runs
//! - **Run labeling** - Union-find connected components over runs
//! - **Blob analysis** - Bounding boxes, surfaces, centroids and values
//! - **Pixel labeling** - The raster-based labeling path
//! - **Run-domain operators** - Decoding, LUTs, inversion, masks, erosion
//! - **Hierarchical watershed** - Immersion flooding with a basin dendrogram
//!
//! # Examples
//!
//! ## Counting blobs
//!
//! ```
//! use camellia_region::camellia_core::{Image, ImageMut, Roi};
//! use camellia_region::{Classifier, RleImage, encode, label};
//!
//! let mut image = ImageMut::<u8>::new(16, 16).unwrap();
//! image.set_in_rect(Roi::new_unchecked(2, 2, 4, 4), 255).unwrap();
//! image.set_in_rect(Roi::new_unchecked(9, 9, 3, 5), 255).unwrap();
//! let image: Image<u8> = image.into();
//!
//! let mut rle = RleImage::new(16, 16).unwrap();
//! encode(&image, Classifier::Threshold(128), &mut rle).unwrap();
//! let blobs = label(&mut rle).unwrap();
//! assert_eq!(blobs.len(), 2);
//! assert_eq!(blobs[1].surface, 15);
//! ```
//!
//! ## Finding holes
//!
//! ```
//! use camellia_region::camellia_core::{Image, ImageMut, Roi};
//! use camellia_region::{Classifier, RleImage, encode, inverse, label};
//!
//! let mut image = ImageMut::<u8>::new(8, 8).unwrap();
//! image.set_in_rect(Roi::new_unchecked(1, 1, 5, 5), 1).unwrap();
//! image.set_pixel(3, 3, 0).unwrap();
//! let image: Image<u8> = image.into();
//!
//! let mut rle = RleImage::new(8, 8).unwrap();
//! encode(&image, Classifier::Identity, &mut rle).unwrap();
//! label(&mut rle).unwrap();
//! inverse(&mut rle);
//! let background = label(&mut rle).unwrap();
//! // The outside and the hole
//! assert_eq!(background.len(), 2);
//! ```

pub mod blob;
pub mod error;
pub mod labeling;
pub mod pixel_label;
mod raster;
pub mod rle;
pub mod watershed;

// Re-export core types
pub use camellia_core;

// Re-export error types
pub use error::{RegionError, RegionResult};

// Re-export run table types and operators
pub use rle::{
    Classifier, ColorClusters, NO_BLOB, RleImage, Run, StructuringElement, apply_lut, apply_mask,
    decode, decode_blobs, encode, encode_color, erode, inverse,
};

// Re-export labeling and blob analysis
pub use blob::{
    BlobInfo, BlobMeasures, BlobSides, BlobTable, analyze_blobs, blob_measures,
    blob_roi_intersect, blob_sides,
};
pub use labeling::{label, label_with_capacity};
pub use pixel_label::{
    LabelEquivalence, blob_analysis_first_scan, blob_analysis_refinement, label_pixels,
};

// Re-export watershed types and functions
pub use watershed::{
    Basin, BasinTable, ConnectivityType, MAX_BASINS, WATERSHED_BORDER, WatershedOptions,
    WatershedOutput, hierarchical_watershed, hierarchical_watershed_regions, watershed_1d,
};
