//! Pixel-based connected component labeling
//!
//! The raster counterpart of [`crate::labeling`]: every pixel of the
//! source, background included, receives a 16-bit label in a single scan,
//! and equal-valued 4-neighbours are recorded as equivalent labels. A
//! second pass ([`blob_analysis_first_scan`]) resolves the equivalences,
//! rewrites the label raster to dense blob indices and gathers the
//! per-blob statistics.

use crate::blob::{Accumulator, BlobTable};
use crate::error::{RegionError, RegionResult};
use crate::raster::{check_unsigned_depth, single_channel, single_channel_mut};
use camellia_core::{Image, ImageMut, Pixel, Roi};

/// Label equivalences produced by [`label_pixels`]
///
/// A union-find forest over labels: every label points at a label not
/// greater than itself, roots point at themselves.
#[derive(Debug, Clone)]
pub struct LabelEquivalence {
    parents: Vec<u16>,
    capacity: usize,
}

impl LabelEquivalence {
    /// Default maximum number of labels
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Largest capacity a 16-bit label raster can address
    pub const MAX_CAPACITY: usize = 1 << 16;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            parents: Vec::new(),
            capacity,
        }
    }

    /// Number of labels handed out.
    #[inline]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether no label was handed out.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Maximum number of labels.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The root label equivalent to `label`.
    ///
    /// Labels that were never handed out are their own root.
    pub fn find(&self, mut label: u16) -> u16 {
        while let Some(&parent) = self.parents.get(label as usize) {
            if parent == label {
                break;
            }
            label = parent;
        }
        label
    }

    /// Number of distinct roots, i.e. of blobs.
    pub fn root_count(&self) -> usize {
        self.parents
            .iter()
            .enumerate()
            .filter(|&(i, &p)| i == p as usize)
            .count()
    }

    fn new_label(&mut self) -> RegionResult<u16> {
        let label = self.parents.len();
        if label >= self.capacity {
            return Err(RegionError::TooManyLabels {
                capacity: self.capacity,
            });
        }
        // capacity <= MAX_CAPACITY, so the label fits
        let label = label as u16;
        self.parents.push(label);
        Ok(label)
    }

    /// Merge two labels; the smaller root wins. Returns the surviving root.
    fn unite(&mut self, a: u16, b: u16) -> u16 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (root, child) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parents[child as usize] = root;
        root
    }
}

/// Label every pixel of `source` into 4-connected same-valued components.
///
/// The result covers the source ROI; labels are provisional until
/// [`blob_analysis_first_scan`] resolves them through the returned
/// equivalence table.
///
/// # Arguments
///
/// * `source` - Unsigned source, 1 to 16 bits, one channel or a COI
/// * `max_labels` - Label capacity, at most [`LabelEquivalence::MAX_CAPACITY`]
///
/// # Errors
///
/// - [`RegionError::UnsupportedDepth`] / [`RegionError::InvalidChannels`]
///   for unsupported sources
/// - [`RegionError::InvalidParameters`] if `max_labels` is 0 or too large
/// - [`RegionError::TooManyLabels`] if the scan needs more labels
pub fn label_pixels<T: Pixel>(
    source: &Image<T>,
    max_labels: usize,
) -> RegionResult<(ImageMut<u16>, LabelEquivalence)> {
    check_unsigned_depth(source)?;
    let channel = single_channel(source)?;
    if max_labels == 0 || max_labels > LabelEquivalence::MAX_CAPACITY {
        return Err(RegionError::InvalidParameters(format!(
            "label capacity must be 1 to {}, got {max_labels}",
            LabelEquivalence::MAX_CAPACITY
        )));
    }

    let roi = source.effective_roi();
    let channels = source.channels() as usize;
    let (w, h) = (roi.w as usize, roi.h as usize);
    let mut labels = ImageMut::<u16>::new(roi.w, roi.h)?;
    let mut equiv = LabelEquivalence::with_capacity(max_labels);
    let mut prev_values: Vec<T> = Vec::with_capacity(w);
    let mut values: Vec<T> = Vec::with_capacity(w);

    for y in 0..h {
        let row = source.row(roi.y + y as u32);
        values.clear();
        values.extend((0..w).map(|x| row[(roi.x as usize + x) * channels + channel]));

        let out = labels.data_mut();
        for x in 0..w {
            let value = values[x];
            let up = (y > 0 && prev_values[x] == value).then(|| out[(y - 1) * w + x]);
            let left = (x > 0 && values[x - 1] == value).then(|| out[y * w + x - 1]);
            let label = match (up, left) {
                (Some(u), Some(l)) if u == l => u,
                (Some(u), Some(l)) => equiv.unite(u, l),
                (Some(u), None) => u,
                (None, Some(l)) => l,
                (None, None) => equiv.new_label().inspect_err(|_| {
                    tracing::warn!(max_labels, "pixel labeling: too many labels");
                })?,
            };
            out[y * w + x] = label;
        }
        std::mem::swap(&mut prev_values, &mut values);
    }

    tracing::debug!(
        labels = equiv.len(),
        width = roi.w,
        height = roi.h,
        "pixel labeling"
    );
    Ok((labels, equiv))
}

/// Check that `original` can be read alongside a label raster.
fn check_original<T: Pixel>(original: &Image<T>, labels: Roi) -> RegionResult<(usize, Roi)> {
    let channel = single_channel(original)?;
    let roi = original.effective_roi();
    if (roi.w, roi.h) != (labels.w, labels.h) {
        return Err(RegionError::DimensionMismatch {
            expected: (labels.w, labels.h),
            actual: (roi.w, roi.h),
        });
    }
    Ok((channel, roi))
}

/// Resolve label equivalences and compute the blob table.
///
/// Every label of the ROI of `labels` is rewritten in place to its dense
/// blob index, blobs being numbered in raster order of their first pixel.
/// With `original`, each blob's value, min and max are the average,
/// minimum and maximum of its pixels; without, they are 0.
///
/// `first_run` and `last_run` hold the offsets (`y * width + x`, relative
/// to the ROI) of the blob's first and last pixels.
///
/// # Errors
///
/// - [`RegionError::InvalidChannels`] for a multi-channel raster without COI
/// - [`RegionError::DimensionMismatch`] if `original` differs in size
/// - [`RegionError::InvalidParameters`] if a label was never handed out;
///   `labels` is then left untouched
pub fn blob_analysis_first_scan<T: Pixel>(
    labels: &mut ImageMut<u16>,
    original: Option<&Image<T>>,
    equiv: &LabelEquivalence,
) -> RegionResult<BlobTable> {
    let channel = single_channel_mut(labels)?;
    let roi = labels.effective_roi();
    let original = original.map(|o| check_original(o, roi).map(|c| (o, c))).transpose()?;

    let channels = labels.channels() as usize;
    for y in 0..roi.h {
        let row = labels.row(roi.y + y);
        for x in 0..roi.w {
            let label = row[(roi.x + x) as usize * channels + channel];
            if label as usize >= equiv.len() {
                return Err(RegionError::InvalidParameters(format!(
                    "label {label} at ({}, {}) was never handed out",
                    roi.x + x,
                    roi.y + y
                )));
            }
        }
    }

    let mut dense = vec![usize::MAX; equiv.len()];
    let mut acc: Vec<Accumulator> = Vec::new();
    for y in 0..roi.h {
        let orig_row = original.map(|(o, (c, r))| (o.row(r.y + y), c, r.x, o.channels()));
        let row = labels.row_mut(roi.y + y);
        for x in 0..roi.w {
            let slot = &mut row[(roi.x + x) as usize * channels + channel];
            let root = equiv.find(*slot) as usize;
            let offset = (y * roi.w + x) as usize;
            if dense[root] == usize::MAX {
                dense[root] = acc.len();
                acc.push(Accumulator::new(offset));
            }
            let id = dense[root];
            let a = &mut acc[id];
            a.add_span(x, y, 1, offset);
            if let Some((orig, c, ox, oc)) = orig_row {
                a.add_value(orig[(ox + x) as usize * oc as usize + c].to_u32());
            }
            // id < equiv.len() <= MAX_CAPACITY
            *slot = id as u16;
        }
    }

    let mut blobs = BlobTable::with_capacity(equiv.capacity());
    for (id, a) in acc.iter().enumerate() {
        let blob = if original.is_some() {
            a.finish_measured(id)
        } else {
            a.finish_class(id, 0)
        };
        blobs.push(blob)?;
    }
    tracing::debug!(blobs = blobs.len(), "pixel blob analysis");
    Ok(blobs)
}

/// Recompute the value, min and max of every blob from `original`.
///
/// `labels` must hold dense blob indices, as left by
/// [`blob_analysis_first_scan`]. The average is taken over the pixels
/// actually found, so discarded blobs are measured too.
///
/// # Errors
///
/// - [`RegionError::InvalidChannels`] / [`RegionError::DimensionMismatch`]
///   if the rasters do not match
/// - [`RegionError::InvalidBlob`] if a label is past the blob table
pub fn blob_analysis_refinement<T: Pixel>(
    labels: &ImageMut<u16>,
    original: &Image<T>,
    blobs: &mut BlobTable,
) -> RegionResult<()> {
    let channel = single_channel_mut(labels)?;
    let roi = labels.effective_roi();
    let (orig_channel, orig_roi) = check_original(original, roi)?;

    let count = blobs.len();
    let channels = labels.channels() as usize;
    let orig_channels = original.channels() as usize;
    // (sum, pixels, min, max) per blob
    let mut sums = vec![(0u64, 0u64, u32::MAX, 0u32); count];

    for y in 0..roi.h {
        let row = labels.row(roi.y + y);
        let orig = original.row(orig_roi.y + y);
        for x in 0..roi.w {
            let id = row[(roi.x + x) as usize * channels + channel] as usize;
            let s = sums
                .get_mut(id)
                .ok_or(RegionError::InvalidBlob { index: id, count })?;
            let value = orig[(orig_roi.x + x) as usize * orig_channels + orig_channel].to_u32();
            s.0 += u64::from(value);
            s.1 += 1;
            s.2 = s.2.min(value);
            s.3 = s.3.max(value);
        }
    }

    for (blob, &(sum, pixels, min, max)) in blobs.blobs_mut().iter_mut().zip(&sums) {
        if pixels > 0 {
            blob.value = (sum / pixels) as u32;
            blob.min = min;
            blob.max = max;
        }
    }
    Ok(())
}
