//! RLE encoding
//!
//! Converts a raster into a run table, classifying every pixel on the way.
//! Adjacent pixels of the same class on a line end up in the same run.

use super::RleImage;
use crate::error::{RegionError, RegionResult};
use crate::raster::{check_unsigned_depth, single_channel};
use camellia_core::{Image, Lut, Pixel};

/// Per-pixel classification applied while encoding
#[derive(Debug, Clone, Copy)]
pub enum Classifier<'a> {
    /// The class is the pixel value
    Identity,
    /// The class is `lut[value]`; the LUT must cover `2^depth` entries
    Lut(&'a Lut),
    /// Class 1 when `value >= threshold`, else 0
    Threshold(u32),
    /// Class 1 when `value < threshold`, else 0
    ThresholdInv(u32),
}

impl Classifier<'_> {
    #[inline]
    fn classify(&self, value: u32) -> u32 {
        match *self {
            Classifier::Identity => value,
            Classifier::Lut(lut) => lut.lookup(value as usize),
            Classifier::Threshold(t) => u32::from(value >= t),
            Classifier::ThresholdInv(t) => u32::from(value < t),
        }
    }
}

/// Interval clusters for colour classification
///
/// Each cluster is one inclusive `(min, max)` range per channel. A pixel
/// belongs to the first cluster whose ranges all contain its channel
/// values. Cluster numbers are 1-based; 0 means "no cluster".
#[derive(Debug, Clone)]
pub struct ColorClusters {
    channels: u32,
    ranges: Vec<(u32, u32)>,
}

impl ColorClusters {
    /// Maximum number of channels a cluster can constrain
    pub const MAX_CHANNELS: u32 = 3;

    /// Create an empty cluster set over `channels` channels.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidChannels`] unless `1 <= channels <= 3`.
    pub fn new(channels: u32) -> RegionResult<Self> {
        if channels == 0 || channels > Self::MAX_CHANNELS {
            return Err(RegionError::InvalidChannels {
                expected: "1 to 3",
                actual: channels,
            });
        }
        Ok(Self {
            channels,
            ranges: Vec::new(),
        })
    }

    /// Add a cluster and return its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameters`] if `ranges` does not have
    /// one entry per channel or a range has `min > max`.
    pub fn add(&mut self, ranges: &[(u32, u32)]) -> RegionResult<u32> {
        if ranges.len() != self.channels as usize {
            return Err(RegionError::InvalidParameters(format!(
                "cluster needs {} ranges, got {}",
                self.channels,
                ranges.len()
            )));
        }
        if let Some(&(min, max)) = ranges.iter().find(|(min, max)| min > max) {
            return Err(RegionError::InvalidParameters(format!(
                "empty cluster range {min}..={max}"
            )));
        }
        self.ranges.extend_from_slice(ranges);
        Ok(self.len() as u32)
    }

    /// Number of channels each cluster constrains.
    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Number of clusters.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len() / self.channels as usize
    }

    /// Whether no cluster was added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The 1-based cluster of a pixel, or 0.
    pub fn classify(&self, pixel: &[u32]) -> u32 {
        self.ranges
            .chunks_exact(self.channels as usize)
            .position(|cluster| {
                cluster
                    .iter()
                    .zip(pixel)
                    .all(|(&(min, max), &v)| v >= min && v <= max)
            })
            .map_or(0, |i| i as u32 + 1)
    }
}

/// Encode a single-channel image into `dest`.
///
/// The region of interest is honoured; `dest` takes the ROI's dimensions.
/// Every run's `blob` is set to its own index.
///
/// # Arguments
///
/// * `image` - Unsigned source, 1 to 16 bits, one channel or a COI
/// * `classifier` - How pixel values map to run values
/// * `dest` - Run table, fully overwritten
///
/// # Errors
///
/// - [`RegionError::UnsupportedDepth`] for signed or deeper sources
/// - [`RegionError::InvalidChannels`] for multi-channel sources without COI
/// - [`RegionError::InvalidParameters`] if a LUT is too short for the depth
/// - [`RegionError::RunCapacityExceeded`] if `dest` is too small; `dest`
///   is left empty with its capacity doubled
///
/// # Examples
///
/// ```
/// use camellia_core::{Image, ImageMut};
/// use camellia_region::rle::{Classifier, RleImage, encode};
///
/// let mut image = ImageMut::<u8>::new(4, 1).unwrap();
/// image.set_pixel(1, 0, 200).unwrap();
/// image.set_pixel(2, 0, 220).unwrap();
///
/// let image: Image<u8> = image.into();
/// let mut rle = RleImage::new(4, 1).unwrap();
/// encode(&image, Classifier::Threshold(128), &mut rle).unwrap();
/// let values: Vec<u32> = rle.runs().iter().map(|r| r.value).collect();
/// assert_eq!(values, vec![0, 1, 0]);
/// ```
pub fn encode<T: Pixel>(
    image: &Image<T>,
    classifier: Classifier<'_>,
    dest: &mut RleImage,
) -> RegionResult<()> {
    check_unsigned_depth(image)?;
    let channel = single_channel(image)?;
    if let Classifier::Lut(lut) = classifier {
        let needed = 1usize << image.depth();
        if lut.len() < needed {
            return Err(RegionError::InvalidParameters(format!(
                "lut has {} entries, {}-bit source needs {needed}",
                lut.len(),
                image.depth()
            )));
        }
    }

    let channels = image.channels() as usize;
    let roi = image.effective_roi();
    dest.begin(roi.w, roi.h);
    for line in 0..roi.h {
        let row = image.row(roi.y + line);
        for x in roi.x..roi.right() {
            let value = row[x as usize * channels + channel].to_u32();
            dest.push_joined(classifier.classify(value), 1, line)?;
        }
    }

    tracing::debug!(
        runs = dest.len(),
        width = roi.w,
        height = roi.h,
        "rle encode"
    );
    Ok(())
}

/// Encode a colour image into `dest` using interval clusters.
///
/// Every pixel takes the number of the first cluster matching all its
/// channels, or 0. The region of interest is honoured.
///
/// # Errors
///
/// - [`RegionError::UnsupportedDepth`] for signed sources
/// - [`RegionError::InvalidChannels`] if the image channel count differs
///   from the clusters'
/// - [`RegionError::InvalidParameters`] if `clusters` is empty
/// - [`RegionError::RunCapacityExceeded`] as for [`encode`]
pub fn encode_color<T: Pixel>(
    image: &Image<T>,
    clusters: &ColorClusters,
    dest: &mut RleImage,
) -> RegionResult<()> {
    if T::SIGNED {
        return Err(RegionError::UnsupportedDepth {
            expected: "unsigned",
            actual: image.depth(),
        });
    }
    if image.channels() != clusters.channels() {
        return Err(RegionError::InvalidChannels {
            expected: "the cluster channel count",
            actual: image.channels(),
        });
    }
    if clusters.is_empty() {
        return Err(RegionError::InvalidParameters(
            "no colour cluster defined".into(),
        ));
    }

    let channels = image.channels() as usize;
    let roi = image.effective_roi();
    let mut pixel = [0u32; ColorClusters::MAX_CHANNELS as usize];
    dest.begin(roi.w, roi.h);
    for line in 0..roi.h {
        let row = image.row(roi.y + line);
        for x in roi.x..roi.right() {
            let start = x as usize * channels;
            for (p, s) in pixel.iter_mut().zip(&row[start..start + channels]) {
                *p = s.to_u32();
            }
            let class = clusters.classify(&pixel[..channels]);
            dest.push_joined(class, 1, line)?;
        }
    }

    tracing::debug!(
        runs = dest.len(),
        clusters = clusters.len(),
        "rle colour encode"
    );
    Ok(())
}
