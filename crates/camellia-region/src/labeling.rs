//! Run-based connected component labeling
//!
//! Labels the runs of an [`RleImage`] into 4-connected blobs. Two runs
//! belong to the same blob when a chain of same-valued runs links them,
//! each run of the chain touching the next one on the adjacent line (or
//! directly to its left). Runs of value 0 are background and never
//! labeled.
//!
//! # Algorithm
//!
//! The `blob` field of every run is a union-find parent index. Upper and
//! lower lines are scanned in lock step; every overlapping pair of equal
//! non-zero values is united, the lower root index becoming the parent, so
//! parents always precede their children. A forward pass then points every
//! run at its root, and the blob analysis pass maps roots to dense blob
//! indices while accumulating per-blob statistics.

use crate::blob::{BlobTable, first_scan};
use crate::error::RegionResult;
use crate::rle::{RleImage, Run};

/// Find the root of run `i`, halving the path on the way.
fn find_root(runs: &mut [Run], mut i: usize) -> usize {
    while runs[i].blob != i {
        let grandparent = runs[runs[i].blob].blob;
        runs[i].blob = grandparent;
        i = grandparent;
    }
    i
}

/// Merge the sets of runs `a` and `b`; the smaller root wins.
fn unite(runs: &mut [Run], a: usize, b: usize) {
    let ra = find_root(runs, a);
    let rb = find_root(runs, b);
    if ra < rb {
        runs[rb].blob = ra;
    } else if rb < ra {
        runs[ra].blob = rb;
    }
}

/// Unite same-valued foreground runs that touch across lines `upper` and
/// `lower`, both given as index ranges.
fn unite_lines(runs: &mut [Run], upper: std::ops::Range<usize>, lower: std::ops::Range<usize>) {
    let (mut i, mut j) = (upper.start, lower.start);
    let (mut upper_x, mut lower_x) = (0u32, 0u32);
    while i < upper.end && j < lower.end {
        let upper_end = upper_x + runs[i].length;
        let lower_end = lower_x + runs[j].length;
        let value = runs[i].value;
        if value != 0 && value == runs[j].value {
            unite(runs, i, j);
        }
        if upper_end <= lower_end {
            upper_x = upper_end;
            i += 1;
        }
        if lower_end <= upper_end {
            lower_x = lower_end;
            j += 1;
        }
    }
}

/// Label a run table with the default blob capacity.
///
/// See [`label_with_capacity`].
pub fn label(rle: &mut RleImage) -> RegionResult<BlobTable> {
    label_with_capacity(rle, BlobTable::DEFAULT_CAPACITY)
}

/// Label a run table into at most `max_blobs` blobs.
///
/// On success every foreground run holds its dense blob index in `blob`,
/// background runs hold [`crate::rle::NO_BLOB`], and the returned table
/// describes each blob.
///
/// # Errors
///
/// - [`crate::RegionError::EmptyImage`] if the table holds no runs
/// - [`crate::RegionError::TooManyBlobs`] if more than `max_blobs` blobs
///   exist; the run table is then left in an unusable, unlabeled state
///
/// # Examples
///
/// ```
/// use camellia_core::Image;
/// use camellia_region::labeling::label;
/// use camellia_region::rle::{Classifier, RleImage, encode};
///
/// let image = Image::<u8>::from_vec(4, 2, 1, vec![1, 0, 0, 1, 1, 1, 0, 1]).unwrap();
/// let mut rle = RleImage::new(4, 2).unwrap();
/// encode(&image, Classifier::Identity, &mut rle).unwrap();
/// let blobs = label(&mut rle).unwrap();
/// assert_eq!(blobs.len(), 2);
/// assert_eq!(blobs[0].surface, 3);
/// ```
pub fn label_with_capacity(rle: &mut RleImage, max_blobs: usize) -> RegionResult<BlobTable> {
    if rle.is_empty() {
        return Err(crate::RegionError::EmptyImage);
    }
    let starts = rle.line_starts();
    let runs = rle.runs_mut();

    for (i, run) in runs.iter_mut().enumerate() {
        run.blob = i;
    }

    for y in 0..starts.len() - 1 {
        let line = starts[y]..starts[y + 1];
        for k in line.start + 1..line.end {
            if runs[k].value != 0 && runs[k].value == runs[k - 1].value {
                unite(runs, k - 1, k);
            }
        }
        if y > 0 {
            unite_lines(runs, starts[y - 1]..starts[y], line);
        }
    }

    // Parents precede children, so one forward pass reaches every root.
    for i in 0..runs.len() {
        let parent = runs[i].blob;
        runs[i].blob = runs[parent].blob;
    }

    let blobs = first_scan(rle, max_blobs)?;
    tracing::debug!(runs = rle.len(), blobs = blobs.len(), "rle labeling");
    Ok(blobs)
}
