//! Blob analysis
//!
//! Per-blob statistics computed from a labeled run table (or, for the
//! pixel-based path, from a label raster): bounding box, surface,
//! centroid, and the value / min / max of either the run class or the
//! pixels of an original image.
//!
//! A [`BlobTable`] is also the handle callers use to prune blobs: a blob
//! whose `surface` is 0 is considered discarded.

use crate::error::{RegionError, RegionResult};
use crate::raster::single_channel;
use crate::rle::{NO_BLOB, RleImage};
use camellia_core::{Image, Pixel, Roi};
use std::ops::Index;

/// Statistics of one blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    /// Dense blob index
    pub id: usize,
    /// Left of the bounding box
    pub left: u32,
    /// Top of the bounding box
    pub top: u32,
    /// Width of the bounding box
    pub width: u32,
    /// Height of the bounding box
    pub height: u32,
    /// Number of pixels; 0 marks a discarded blob
    pub surface: u32,
    /// Centroid x (truncated)
    pub cx: u32,
    /// Centroid y (truncated)
    pub cy: u32,
    /// Run class, or average original value after a measure pass
    pub value: u32,
    /// Minimum value
    pub min: u32,
    /// Maximum value
    pub max: u32,
    /// Index of the first run (pixel-based labeling: first pixel offset)
    pub first_run: usize,
    /// Index of the last run (pixel-based labeling: last pixel offset)
    pub last_run: usize,
}

impl BlobInfo {
    /// The bounding box as a [`Roi`].
    pub fn bounding_box(&self) -> Roi {
        Roi::new_unchecked(self.left, self.top, self.width, self.height)
    }

    /// Whether the blob was discarded by the caller.
    #[inline]
    pub fn is_discarded(&self) -> bool {
        self.surface == 0
    }
}

/// Blobs found by a labeling pass
#[derive(Debug, Clone, Default)]
pub struct BlobTable {
    blobs: Vec<BlobInfo>,
    capacity: usize,
}

impl BlobTable {
    /// Default maximum number of blobs
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            blobs: Vec::new(),
            capacity,
        }
    }

    /// Number of blobs.
    #[inline]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blob was found.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Maximum number of blobs the table accepted.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get blob `id`.
    pub fn get(&self, id: usize) -> Option<&BlobInfo> {
        self.blobs.get(id)
    }

    /// Iterate over every blob, discarded ones included.
    pub fn iter(&self) -> std::slice::Iter<'_, BlobInfo> {
        self.blobs.iter()
    }

    /// Iterate over the blobs that were not discarded.
    pub fn iter_active(&self) -> impl Iterator<Item = &BlobInfo> {
        self.blobs.iter().filter(|b| !b.is_discarded())
    }

    /// Discard blob `id` by zeroing its surface.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidBlob`] if `id` is out of range.
    pub fn discard(&mut self, id: usize) -> RegionResult<()> {
        let count = self.blobs.len();
        let blob = self
            .blobs
            .get_mut(id)
            .ok_or(RegionError::InvalidBlob { index: id, count })?;
        blob.surface = 0;
        Ok(())
    }

    /// Discard every blob smaller than `min_surface` pixels.
    ///
    /// Returns the number of blobs discarded.
    pub fn discard_smaller_than(&mut self, min_surface: u32) -> usize {
        let mut count = 0;
        for blob in self.blobs.iter_mut() {
            if blob.surface > 0 && blob.surface < min_surface {
                blob.surface = 0;
                count += 1;
            }
        }
        count
    }

    /// The blobs as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[BlobInfo] {
        &self.blobs
    }

    pub(crate) fn push(&mut self, blob: BlobInfo) -> RegionResult<()> {
        if self.blobs.len() >= self.capacity {
            return Err(RegionError::TooManyBlobs {
                capacity: self.capacity,
            });
        }
        self.blobs.push(blob);
        Ok(())
    }

    pub(crate) fn blobs_mut(&mut self) -> &mut [BlobInfo] {
        &mut self.blobs
    }
}

impl Index<usize> for BlobTable {
    type Output = BlobInfo;

    fn index(&self, id: usize) -> &BlobInfo {
        &self.blobs[id]
    }
}

impl<'a> IntoIterator for &'a BlobTable {
    type Item = &'a BlobInfo;
    type IntoIter = std::slice::Iter<'a, BlobInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

/// Running sums for one blob
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    surface: u64,
    sum_x: u64,
    sum_y: u64,
    sum_value: u64,
    min: u32,
    max: u32,
    first: usize,
    last: usize,
}

impl Accumulator {
    pub(crate) fn new(first: usize) -> Self {
        Self {
            left: u32::MAX,
            top: u32::MAX,
            right: 0,
            bottom: 0,
            surface: 0,
            sum_x: 0,
            sum_y: 0,
            sum_value: 0,
            min: u32::MAX,
            max: 0,
            first,
            last: first,
        }
    }

    /// Add `length` pixels starting at (x, y); `index` is the run or pixel.
    pub(crate) fn add_span(&mut self, x: u32, y: u32, length: u32, index: usize) {
        let len = u64::from(length);
        self.left = self.left.min(x);
        self.right = self.right.max(x + length);
        self.top = self.top.min(y);
        self.bottom = self.bottom.max(y + 1);
        self.surface += len;
        // x + (x + 1) + ... + (x + length - 1)
        self.sum_x += len * (2 * u64::from(x) + len - 1) / 2;
        self.sum_y += u64::from(y) * len;
        self.last = index;
    }

    pub(crate) fn add_value(&mut self, value: u32) {
        self.sum_value += u64::from(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Blob with `value` as its value, min and max.
    pub(crate) fn finish_class(&self, id: usize, value: u32) -> BlobInfo {
        BlobInfo {
            value,
            min: value,
            max: value,
            ..self.finish_geometry(id)
        }
    }

    /// Blob whose value is the average of the added values.
    pub(crate) fn finish_measured(&self, id: usize) -> BlobInfo {
        BlobInfo {
            value: (self.sum_value / self.surface.max(1)) as u32,
            min: self.min,
            max: self.max,
            ..self.finish_geometry(id)
        }
    }

    fn finish_geometry(&self, id: usize) -> BlobInfo {
        let surface = self.surface.max(1);
        let (left, top) = if self.surface == 0 {
            (0, 0)
        } else {
            (self.left, self.top)
        };
        BlobInfo {
            id,
            left,
            top,
            width: self.right.saturating_sub(left),
            height: self.bottom.saturating_sub(top),
            surface: u32::try_from(self.surface).unwrap_or(u32::MAX),
            cx: (self.sum_x / surface) as u32,
            cy: (self.sum_y / surface) as u32,
            value: 0,
            min: 0,
            max: 0,
            first_run: self.first,
            last_run: self.last,
        }
    }
}

/// Map roots to dense blob indices and gather statistics.
///
/// Expects every foreground run to point at its root; roots precede their
/// members. Called by the labeling pass.
pub(crate) fn first_scan(rle: &mut RleImage, max_blobs: usize) -> RegionResult<BlobTable> {
    let width = rle.width();
    let mut dense = vec![NO_BLOB; rle.len()];
    let mut acc: Vec<(Accumulator, u32)> = Vec::new();
    let mut x = 0u32;
    let mut line = 0u32;
    let mut overflow = false;

    for (i, run) in rle.runs_mut().iter_mut().enumerate() {
        if run.line != line {
            line = run.line;
            x = 0;
        }
        if run.value == 0 {
            run.blob = NO_BLOB;
        } else {
            let root = run.blob;
            if dense[root] == NO_BLOB {
                if acc.len() >= max_blobs {
                    overflow = true;
                    break;
                }
                dense[root] = acc.len();
                acc.push((Accumulator::new(i), run.value));
            }
            let id = dense[root];
            acc[id].0.add_span(x, line, run.length, i);
            run.blob = id;
        }
        x += run.length;
        debug_assert!(x <= width);
    }

    if overflow {
        tracing::warn!(max_blobs, "rle labeling: too many blobs");
        rle.set_labeled(false);
        return Err(RegionError::TooManyBlobs {
            capacity: max_blobs,
        });
    }

    let mut blobs = BlobTable::with_capacity(max_blobs);
    for (id, (a, value)) in acc.iter().enumerate() {
        blobs.push(a.finish_class(id, *value))?;
    }
    rle.set_labeled(true);
    Ok(blobs)
}

/// Check that `original` can be read in step with `rle`.
fn check_original<T: Pixel>(rle: &RleImage, original: &Image<T>) -> RegionResult<(usize, Roi)> {
    let channel = single_channel(original)?;
    let roi = original.effective_roi();
    if (roi.w, roi.h) != (rle.width(), rle.height()) {
        return Err(RegionError::DimensionMismatch {
            expected: (rle.width(), rle.height()),
            actual: (roi.w, roi.h),
        });
    }
    Ok((channel, roi))
}

/// Compute the blob table of a labeled run table.
///
/// Without `original`, each blob's value, min and max are its run class.
/// With `original` (single channel or COI, ROI the size of the table),
/// they are the average, minimum and maximum of the blob's pixels.
///
/// Discarding is not preserved: every blob comes back with its surface.
///
/// # Errors
///
/// - [`RegionError::NotLabeled`] if `rle` was not labeled
/// - [`RegionError::DimensionMismatch`] / [`RegionError::InvalidChannels`]
///   if `original` does not match
pub fn analyze_blobs<T: Pixel>(
    rle: &RleImage,
    original: Option<&Image<T>>,
) -> RegionResult<BlobTable> {
    if !rle.is_labeled() {
        return Err(RegionError::NotLabeled);
    }
    let source = original.map(|o| check_original(rle, o)).transpose()?;

    let count = rle
        .runs()
        .iter()
        .filter(|r| r.blob != NO_BLOB)
        .map(|r| r.blob + 1)
        .max()
        .unwrap_or(0);
    let mut acc: Vec<Option<(Accumulator, u32)>> = vec![None; count];

    let mut x = 0u32;
    let mut line = 0u32;
    for (i, run) in rle.runs().iter().enumerate() {
        if run.line != line {
            line = run.line;
            x = 0;
        }
        if run.blob != NO_BLOB {
            let (a, _) = acc[run.blob].get_or_insert_with(|| (Accumulator::new(i), run.value));
            a.add_span(x, line, run.length, i);
            if let (Some(image), Some((channel, roi))) = (original, source) {
                let row = image.row(roi.y + line);
                let channels = image.channels() as usize;
                for px in roi.x + x..roi.x + x + run.length {
                    a.add_value(row[px as usize * channels + channel].to_u32());
                }
            }
        }
        x += run.length;
    }

    let mut blobs = BlobTable::with_capacity(count.max(BlobTable::DEFAULT_CAPACITY));
    for (id, slot) in acc.iter().enumerate() {
        let info = match slot {
            Some((a, _)) if original.is_some() => a.finish_measured(id),
            Some((a, value)) => a.finish_class(id, *value),
            None => Accumulator::new(0).finish_class(id, 0),
        };
        blobs.push(info)?;
    }
    Ok(blobs)
}

/// Average, minimum and maximum of a blob's original pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobMeasures {
    /// Average value (truncated)
    pub average: u32,
    /// Minimum value
    pub min: u32,
    /// Maximum value
    pub max: u32,
}

/// Measure blob `id` on `original` and store the result in its entry.
///
/// Only the blob's runs, from `first_run` to `last_run`, are visited.
///
/// # Errors
///
/// - [`RegionError::NotLabeled`] if `rle` was not labeled
/// - [`RegionError::InvalidBlob`] if `id` is out of range
/// - [`RegionError::DimensionMismatch`] / [`RegionError::InvalidChannels`]
///   if `original` does not match
pub fn blob_measures<T: Pixel>(
    rle: &RleImage,
    blobs: &mut BlobTable,
    id: usize,
    original: &Image<T>,
) -> RegionResult<BlobMeasures> {
    if !rle.is_labeled() {
        return Err(RegionError::NotLabeled);
    }
    let count = blobs.len();
    let (first, last) = blobs
        .get(id)
        .map(|b| (b.first_run, b.last_run))
        .ok_or(RegionError::InvalidBlob { index: id, count })?;
    let (channel, roi) = check_original(rle, original)?;
    let channels = original.channels() as usize;

    let mut acc = Accumulator::new(first);
    for_each_span(rle, id, first, last, |x, y, length| {
        let row = original.row(roi.y + y);
        for px in roi.x + x..roi.x + x + length {
            acc.add_value(row[px as usize * channels + channel].to_u32());
        }
        acc.surface += u64::from(length);
    });
    let measured = acc.finish_measured(id);
    let measures = BlobMeasures {
        average: measured.value,
        min: measured.min,
        max: measured.max,
    };

    let blob = &mut blobs.blobs_mut()[id];
    blob.value = measures.average;
    blob.min = measures.min;
    blob.max = measures.max;
    Ok(measures)
}

/// Call `f(x, y, length)` for every run of blob `id` in `first..=last`.
fn for_each_span(
    rle: &RleImage,
    id: usize,
    first: usize,
    last: usize,
    mut f: impl FnMut(u32, u32, u32),
) {
    let runs = rle.runs();
    if first >= runs.len() {
        return;
    }
    // x of the first run: sum the lengths before it on its line.
    let line = runs[first].line;
    let mut x: u32 = runs[..first]
        .iter()
        .rev()
        .take_while(|r| r.line == line)
        .map(|r| r.length)
        .sum();
    let mut current = line;
    for run in &runs[first..=last.min(runs.len() - 1)] {
        if run.line != current {
            current = run.line;
            x = 0;
        }
        if run.blob == id {
            f(x, run.line, run.length);
        }
        x += run.length;
    }
}

/// Outline of a blob, relative to its bounding box
///
/// A 4-connected blob covers every row and column of its bounding box,
/// so every entry is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSides {
    /// Per row: x of the leftmost pixel
    pub left: Vec<u32>,
    /// Per row: x one past the rightmost pixel
    pub right: Vec<u32>,
    /// Per column: y of the topmost pixel
    pub top: Vec<u32>,
    /// Per column: y of the bottommost pixel
    pub bottom: Vec<u32>,
}

/// Compute the sides of blob `id`.
///
/// # Errors
///
/// - [`RegionError::NotLabeled`] if `rle` was not labeled
/// - [`RegionError::InvalidBlob`] if `id` is out of range
pub fn blob_sides(rle: &RleImage, blobs: &BlobTable, id: usize) -> RegionResult<BlobSides> {
    if !rle.is_labeled() {
        return Err(RegionError::NotLabeled);
    }
    let blob = blobs.get(id).ok_or(RegionError::InvalidBlob {
        index: id,
        count: blobs.len(),
    })?;
    let (w, h) = (blob.width as usize, blob.height as usize);
    let mut sides = BlobSides {
        left: vec![blob.width; h],
        right: vec![0; h],
        top: vec![blob.height; w],
        bottom: vec![0; w],
    };

    for_each_span(rle, id, blob.first_run, blob.last_run, |x, y, length| {
        let row = (y - blob.top) as usize;
        let start = x - blob.left;
        sides.left[row] = sides.left[row].min(start);
        sides.right[row] = sides.right[row].max(start + length);
        for col in start..start + length {
            let col = col as usize;
            sides.top[col] = sides.top[col].min(y - blob.top);
            sides.bottom[col] = sides.bottom[col].max(y - blob.top);
        }
    });
    Ok(sides)
}

/// Count the pixels of blob `id` inside `roi` (table coordinates).
///
/// # Errors
///
/// - [`RegionError::NotLabeled`] if `rle` was not labeled
/// - [`RegionError::InvalidBlob`] if `id` is out of range
pub fn blob_roi_intersect(
    rle: &RleImage,
    blobs: &BlobTable,
    id: usize,
    roi: Roi,
) -> RegionResult<u32> {
    if !rle.is_labeled() {
        return Err(RegionError::NotLabeled);
    }
    let blob = blobs.get(id).ok_or(RegionError::InvalidBlob {
        index: id,
        count: blobs.len(),
    })?;
    if blob.bounding_box().intersect(&roi).is_none() {
        return Ok(0);
    }

    let mut total = 0u32;
    for_each_span(rle, id, blob.first_run, blob.last_run, |x, y, length| {
        if y >= roi.y && y < roi.bottom() {
            let left = x.max(roi.x);
            let right = (x + length).min(roi.right());
            total += right.saturating_sub(left);
        }
    });
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::label;
    use crate::rle::{Classifier, encode};

    fn labeled(width: u32, height: u32, values: &[u8]) -> (RleImage, BlobTable) {
        let image = Image::from_vec(width, height, 1, values.to_vec()).unwrap();
        let mut rle = RleImage::new(width, height).unwrap();
        encode(&image, Classifier::Identity, &mut rle).unwrap();
        let blobs = label(&mut rle).unwrap();
        (rle, blobs)
    }

    const PLUS: [u8; 25] = [
        0, 0, 1, 0, 0, //
        0, 0, 1, 0, 0, //
        0, 1, 1, 1, 0, //
        0, 0, 1, 0, 0, //
        0, 0, 0, 0, 0,
    ];

    #[test]
    fn test_first_scan_statistics() {
        let (_, blobs) = labeled(5, 5, &PLUS);
        assert_eq!(blobs.len(), 1);
        let b = &blobs[0];
        assert_eq!(b.bounding_box(), Roi::new_unchecked(1, 0, 3, 4));
        assert_eq!(b.surface, 6);
        // sum x = 2 + 2 + 1 + 2 + 3 + 2 = 12, sum y = 0 + 1 + 2*3 + 3 = 10
        assert_eq!((b.cx, b.cy), (2, 1));
        assert_eq!((b.value, b.min, b.max), (1, 1, 1));
        assert_eq!(b.first_run, 1);
    }

    #[test]
    fn test_analyze_blobs_matches_first_scan() {
        let (rle, blobs) = labeled(5, 5, &PLUS);
        let again = analyze_blobs::<u8>(&rle, None).unwrap();
        assert_eq!(again.as_slice(), blobs.as_slice());
    }

    #[test]
    fn test_analyze_blobs_with_original() {
        let (rle, _) = labeled(5, 5, &PLUS);
        let original: Vec<u8> = (0..25).map(|i| i as u8 * 2).collect();
        let original = Image::from_vec(5, 5, 1, original).unwrap();
        let blobs = analyze_blobs(&rle, Some(&original)).unwrap();
        // pixels 2, 7, 11, 12, 13, 17 doubled
        assert_eq!(blobs[0].min, 4);
        assert_eq!(blobs[0].max, 34);
        assert_eq!(blobs[0].value, (4 + 14 + 22 + 24 + 26 + 34) / 6);
    }

    #[test]
    fn test_analyze_requires_labels() {
        let image = Image::<u8>::new(2, 2).unwrap();
        let mut rle = RleImage::new(2, 2).unwrap();
        encode(&image, Classifier::Identity, &mut rle).unwrap();
        assert!(matches!(
            analyze_blobs::<u8>(&rle, None),
            Err(RegionError::NotLabeled)
        ));
    }

    #[test]
    fn test_blob_measures() {
        let values = [1, 1, 0, 2, 0, 1, 0, 2];
        let (rle, mut blobs) = labeled(4, 2, &values);
        let original = Image::<u16>::from_vec(4, 2, 1, vec![10, 20, 0, 5, 0, 60, 0, 7]).unwrap();
        let blob = rle.runs()[0].blob;
        let m = blob_measures(&rle, &mut blobs, blob, &original).unwrap();
        assert_eq!(
            m,
            BlobMeasures {
                average: 30,
                min: 10,
                max: 60
            }
        );
        assert_eq!(blobs[blob].value, 30);
        assert!(blob_measures(&rle, &mut blobs, 9, &original).is_err());
    }

    #[test]
    fn test_blob_sides() {
        let (rle, blobs) = labeled(5, 5, &PLUS);
        let sides = blob_sides(&rle, &blobs, 0).unwrap();
        assert_eq!(sides.left, vec![1, 1, 0, 1]);
        assert_eq!(sides.right, vec![2, 2, 3, 2]);
        assert_eq!(sides.top, vec![2, 0, 2]);
        assert_eq!(sides.bottom, vec![2, 3, 2]);
    }

    #[test]
    fn test_blob_roi_intersect() {
        let (rle, blobs) = labeled(5, 5, &PLUS);
        let count = |roi| blob_roi_intersect(&rle, &blobs, 0, roi).unwrap();
        assert_eq!(count(Roi::full(5, 5)), 6);
        assert_eq!(count(Roi::new_unchecked(2, 2, 2, 2)), 3);
        assert_eq!(count(Roi::new_unchecked(0, 0, 2, 5)), 1);
        assert_eq!(count(Roi::new_unchecked(4, 4, 1, 1)), 0);
    }

    #[test]
    fn test_discard() {
        let values = [1, 0, 1, 1];
        let (_, mut blobs) = labeled(4, 1, &values);
        assert_eq!(blobs.iter_active().count(), 2);
        assert_eq!(blobs.discard_smaller_than(2), 1);
        assert!(blobs[0].is_discarded());
        assert_eq!(blobs.iter_active().count(), 1);
        assert!(blobs.discard(5).is_err());
    }
}
