//! Hierarchical watershed
//!
//! Immersion-simulation watershed of a grey-level image (typically a
//! gradient), producing a signed raster of 1-based basin labels and a
//! [`BasinTable`] recording how basins flood into each other.
//!
//! Interior pixels are bucket-sorted by grey level and the relief is
//! flooded level by level. Pixels next to an existing basin extend it in
//! FIFO order; the remaining pixels of a level seed new basins. When two
//! flood fronts meet, the basin whose root has the higher minimum is
//! absorbed by the other one and its dynamics (flooding level minus its
//! minimum) is recorded. Basins that are never absorbed keep a `None`
//! dynamics.
//!
//! Pruning is a two-phase protocol: inspect the table, discard basins
//! (for instance with [`BasinTable::prune_by_dynamics`]), then rebuild
//! the regions with [`hierarchical_watershed_regions`].
//!
//! # Examples
//!
//! ```
//! use camellia_core::{Image, ImageMut};
//! use camellia_region::watershed::{WatershedOptions, hierarchical_watershed};
//!
//! // Two valleys separated by a ridge.
//! let values = vec![
//!     0, 0, 0, 0, 0, 0, 0, //
//!     0, 1, 4, 9, 6, 2, 0, //
//!     0, 0, 0, 0, 0, 0, 0,
//! ];
//! let source = Image::<u8>::from_vec(7, 3, 1, values).unwrap();
//! let mut labels = ImageMut::<i16>::new(7, 3).unwrap();
//! let basins = hierarchical_watershed(&source, &mut labels, &WatershedOptions::default()).unwrap();
//!
//! assert_eq!(basins.len(), 2);
//! assert_eq!(basins[1].dynamics, Some(7));
//! assert_eq!(basins[0].accumulated_surface, 5);
//! ```

use crate::error::{RegionError, RegionResult};
use crate::raster::{check_unsigned_depth, single_channel, single_channel_mut};
use camellia_core::{Image, ImageMut, Pixel};
use std::collections::VecDeque;
use std::ops::Index;

/// Label of the one-pixel ring around the processed area
pub const WATERSHED_BORDER: i16 = i16::MIN;

/// Pixel not reached yet
const INIT: i16 = -32767;
/// Pixel of the current level, not queued
const MASK: i16 = -32766;
/// Pixel of the current level, queued
const INQUEUE: i16 = -32765;

/// Maximum number of basins
///
/// Contour marks `-(label)` must stay clear of the internal sentinels.
pub const MAX_BASINS: usize = (INQUEUE as i32).unsigned_abs() as usize - 1;

/// Connectivity type for neighbour traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, left, right, down)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

/// What the watershed writes at collision pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatershedOutput {
    /// Every interior pixel holds its basin label
    #[default]
    Regions,
    /// Collision pixels hold the negated label of the absorbed basin on
    /// their side and stop the flood, drawing watershed lines
    Contours,
}

/// Options for [`hierarchical_watershed`]
#[derive(Debug, Clone, Default)]
pub struct WatershedOptions {
    /// Neighbourhood used for flooding
    pub connectivity: ConnectivityType,
    /// Regions or contours output
    pub output: WatershedOutput,
}

impl WatershedOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connectivity type
    pub fn with_connectivity(mut self, connectivity: ConnectivityType) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Set output mode
    pub fn with_output(mut self, output: WatershedOutput) -> Self {
        self.output = output;
        self
    }
}

/// A catchment basin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basin {
    /// Flooding level minus minimum when absorbed; `None` if never absorbed
    pub dynamics: Option<u32>,
    /// Grey level of the basin's minimum
    pub minimum: u32,
    /// Index of the basin that absorbed this one
    pub flooded: Option<usize>,
    /// Number of pixels; 0 marks a discarded basin
    pub surface: u32,
    /// Own surface plus the surface of every basin flooded into it
    pub accumulated_surface: u32,
    /// Column of the minimum, in image coordinates
    pub x: u32,
    /// Row of the minimum, in image coordinates
    pub y: u32,
}

impl Basin {
    /// Whether the basin was never absorbed.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.dynamics.is_none()
    }

    /// Whether the basin was discarded by the caller.
    #[inline]
    pub fn is_discarded(&self) -> bool {
        self.surface == 0
    }

    /// Dynamics ordering key, `None` ranking above every value.
    fn rank(&self) -> u64 {
        self.dynamics.map_or(u64::MAX, u64::from)
    }
}

/// Basins found by [`hierarchical_watershed`], indexed by label - 1
#[derive(Debug, Clone, Default)]
pub struct BasinTable {
    basins: Vec<Basin>,
}

impl BasinTable {
    /// Initial number of basin slots
    const INITIAL_CAPACITY: usize = 2048;

    fn new() -> RegionResult<Self> {
        let mut basins = Vec::new();
        basins
            .try_reserve(Self::INITIAL_CAPACITY)
            .map_err(|_| RegionError::AllocationFailed("basin table"))?;
        Ok(Self { basins })
    }

    /// Number of basins.
    #[inline]
    pub fn len(&self) -> usize {
        self.basins.len()
    }

    /// Whether the table holds no basin.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.basins.is_empty()
    }

    /// Get basin `index` (label - 1).
    pub fn get(&self, index: usize) -> Option<&Basin> {
        self.basins.get(index)
    }

    /// Iterate over every basin, discarded ones included.
    pub fn iter(&self) -> std::slice::Iter<'_, Basin> {
        self.basins.iter()
    }

    /// Indices of the basins that were never absorbed.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.basins
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_root())
            .map(|(i, _)| i)
    }

    /// Root of the flood chain starting at basin `index`.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn root_of(&self, index: usize) -> Option<usize> {
        (index < self.basins.len()).then(|| self.root_index(index))
    }

    /// Basin whose label replaces `index`'s when regions are rebuilt.
    ///
    /// That is `index` itself unless it was discarded, else the first
    /// ancestor along the flood chain that was kept or is a root.
    /// Returns `None` if `index` is out of range.
    pub fn survivor_of(&self, index: usize) -> Option<usize> {
        (index < self.basins.len()).then(|| self.survivor_index(index))
    }

    fn root_index(&self, mut index: usize) -> usize {
        while let Some(parent) = self.basins[index].flooded {
            index = parent;
        }
        index
    }

    fn survivor_index(&self, mut index: usize) -> usize {
        loop {
            let basin = &self.basins[index];
            match basin.flooded {
                Some(parent) if basin.surface == 0 => index = parent,
                _ => return index,
            }
        }
    }

    /// Discard basin `index` by zeroing its surface.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameters`] if `index` is out of range.
    pub fn discard(&mut self, index: usize) -> RegionResult<()> {
        let count = self.basins.len();
        let basin = self.basins.get_mut(index).ok_or_else(|| {
            RegionError::InvalidParameters(format!("basin {index} out of range ({count} basins)"))
        })?;
        basin.surface = 0;
        Ok(())
    }

    /// Discard every basin whose dynamics is below `threshold`.
    ///
    /// Roots are never discarded. Returns the number of basins discarded.
    pub fn prune_by_dynamics(&mut self, threshold: u32) -> usize {
        let mut count = 0;
        for basin in self.basins.iter_mut() {
            if basin.surface > 0 && basin.dynamics.is_some_and(|d| d < threshold) {
                basin.surface = 0;
                count += 1;
            }
        }
        tracing::debug!(threshold, count, "watershed pruning");
        count
    }

    /// The basins as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Basin] {
        &self.basins
    }

    fn push(&mut self, basin: Basin) -> RegionResult<()> {
        if self.basins.len() >= MAX_BASINS {
            return Err(RegionError::BasinCapacityExceeded {
                count: self.basins.len() + 1,
                max: MAX_BASINS,
            });
        }
        if self.basins.len() == self.basins.capacity() {
            let additional = self.basins.capacity().max(Self::INITIAL_CAPACITY);
            self.basins
                .try_reserve(additional)
                .map_err(|_| RegionError::AllocationFailed("basin table"))?;
        }
        self.basins.push(basin);
        Ok(())
    }

    /// Add every basin's surface to itself and each basin up its chain.
    fn accumulate_surfaces(&mut self) {
        for basin in self.basins.iter_mut() {
            basin.accumulated_surface = 0;
        }
        for i in 0..self.basins.len() {
            let surface = self.basins[i].surface;
            let mut b = i;
            loop {
                self.basins[b].accumulated_surface += surface;
                match self.basins[b].flooded {
                    Some(parent) => b = parent,
                    None => break,
                }
            }
        }
    }
}

impl Index<usize> for BasinTable {
    type Output = Basin;

    fn index(&self, index: usize) -> &Basin {
        &self.basins[index]
    }
}

impl<'a> IntoIterator for &'a BasinTable {
    type Item = &'a Basin;
    type IntoIter = std::slice::Iter<'a, Basin>;

    fn into_iter(self) -> Self::IntoIter {
        self.basins.iter()
    }
}

/// Flooding state over the ROI, indexed `y * width + x`
struct Immersion<'a> {
    levels: &'a [u32],
    labels: Vec<i16>,
    offsets: Vec<isize>,
    queue: VecDeque<usize>,
    basins: BasinTable,
    output: WatershedOutput,
    width: usize,
    origin: (u32, u32),
}

impl Immersion<'_> {
    /// Queue the pixels of a level that touch a basin, mask the others.
    fn mark_level(&mut self, pixels: &[usize]) {
        for &p in pixels {
            let touches = self
                .offsets
                .iter()
                .any(|&o| self.labels[p.wrapping_add_signed(o)] > 0);
            if touches {
                self.labels[p] = INQUEUE;
                self.queue.push_back(p);
            } else {
                self.labels[p] = MASK;
            }
        }
    }

    /// Extend the basins over the queued pixels (geodesic influence zones).
    fn propagate(&mut self, level: u32) {
        while let Some(p) = self.queue.pop_front() {
            let mut marked = false;
            for k in 0..self.offsets.len() {
                let pp = p.wrapping_add_signed(self.offsets[k]);
                let neighbour = self.labels[pp];
                if neighbour <= 0 {
                    continue;
                }
                if self.labels[p] == INQUEUE {
                    self.labels[p] = neighbour;
                    self.basins.basins[neighbour as usize - 1].surface += 1;
                } else if self.labels[p] != neighbour {
                    self.collide(p, pp, level);
                    if self.output == WatershedOutput::Contours {
                        self.labels[p] = -self.labels[p];
                        marked = true;
                        break;
                    }
                }
            }
            if !marked {
                for k in 0..self.offsets.len() {
                    let pp = p.wrapping_add_signed(self.offsets[k]);
                    if self.labels[pp] == MASK {
                        self.labels[pp] = INQUEUE;
                        self.queue.push_back(pp);
                    }
                }
            }
        }
    }

    /// Resolve the meeting of `p`'s basin with neighbour `pp`'s at `level`.
    ///
    /// In regions mode `p` ends up on the winner's side, or on the side
    /// with the larger dynamics when both share a root. In contours mode
    /// it ends up on the absorbed side, or on the side with the smaller
    /// dynamics.
    fn collide(&mut self, p: usize, pp: usize, level: u32) {
        let own = self.labels[p] as usize - 1;
        let other = self.labels[pp] as usize - 1;
        let root1 = self.basins.root_index(own);
        let root2 = self.basins.root_index(other);

        let move_to_other = if root1 != root2 {
            let key1 = (self.basins.basins[root1].minimum, root1);
            let key2 = (self.basins.basins[root2].minimum, root2);
            let (winner, loser) = if key1 < key2 {
                (root1, root2)
            } else {
                (root2, root1)
            };
            let absorbed = &mut self.basins.basins[loser];
            absorbed.flooded = Some(winner);
            absorbed.dynamics = Some(level - absorbed.minimum);
            match self.output {
                WatershedOutput::Regions => winner == root2,
                WatershedOutput::Contours => winner == root1,
            }
        } else {
            let own_rank = self.basins.basins[own].rank();
            let other_rank = self.basins.basins[other].rank();
            match self.output {
                WatershedOutput::Regions => other_rank > own_rank,
                WatershedOutput::Contours => other_rank < own_rank,
            }
        };

        if move_to_other {
            self.labels[p] = self.labels[pp];
            self.basins.basins[own].surface -= 1;
            self.basins.basins[other].surface += 1;
        }
    }

    /// Turn the pixels still masked at `level` into new basins.
    fn seed_basins(&mut self, level: u32, pixels: &[usize]) -> RegionResult<()> {
        for &p in pixels {
            if self.labels[p] != MASK {
                continue;
            }
            let label = self.basins.len() + 1;
            self.basins.push(Basin {
                dynamics: None,
                minimum: level,
                flooded: None,
                surface: 1,
                accumulated_surface: 0,
                x: self.origin.0 + (p % self.width) as u32,
                y: self.origin.1 + (p / self.width) as u32,
            })?;
            // label <= MAX_BASINS < i16::MAX
            let label = label as i16;
            self.labels[p] = label;
            self.queue.push_back(p);
            while let Some(q) = self.queue.pop_front() {
                for k in 0..self.offsets.len() {
                    let qq = q.wrapping_add_signed(self.offsets[k]);
                    if self.labels[qq] == MASK {
                        self.labels[qq] = label;
                        self.basins.basins[label as usize - 1].surface += 1;
                        self.queue.push_back(qq);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Neighbour offsets in a raster of `width` columns.
fn neighbour_offsets(connectivity: ConnectivityType, width: usize) -> Vec<isize> {
    let w = width as isize;
    match connectivity {
        ConnectivityType::FourWay => vec![-w, -1, 1, w],
        ConnectivityType::EightWay => vec![-w - 1, -w, -w + 1, -1, 1, w - 1, w, w + 1],
    }
}

/// Compute the hierarchical watershed of `source` into `dest`.
///
/// The effective ROI of `source` is processed: its one-pixel border ring
/// is written [`WATERSHED_BORDER`] and every interior pixel receives the
/// 1-based label of its basin (or, in contours mode, the negated label at
/// watershed lines). Pixels of `dest` outside the ROI are left untouched.
///
/// When two basins meet, the root with the lower minimum wins, the lower
/// index breaking ties; the pixel goes to the winner's side. When both
/// already share a root, the pixel goes to the side with the larger
/// dynamics. In contours mode both choices are reversed and the pixel is
/// marked with the negated label of the side it lands on.
///
/// `dest` takes the ROI of `source`, so that
/// [`hierarchical_watershed_regions`] later walks the same area.
///
/// # Arguments
///
/// * `source` - Unsigned source, 1 to 16 bits, one channel or a COI
/// * `dest` - Label raster of the source's dimensions, one channel or a COI
/// * `options` - Connectivity and output mode
///
/// # Errors
///
/// - [`RegionError::UnsupportedDepth`] / [`RegionError::InvalidChannels`]
///   for unsupported rasters
/// - [`RegionError::DimensionMismatch`] if `dest` differs in size
/// - [`RegionError::InvalidParameters`] if the ROI is smaller than 3x3
/// - [`RegionError::BasinCapacityExceeded`] past [`MAX_BASINS`] basins
/// - [`RegionError::AllocationFailed`] if the basin table cannot grow
pub fn hierarchical_watershed<T: Pixel>(
    source: &Image<T>,
    dest: &mut ImageMut<i16>,
    options: &WatershedOptions,
) -> RegionResult<BasinTable> {
    check_unsigned_depth(source)?;
    let channel = single_channel(source)?;
    let dest_channel = single_channel_mut(dest)?;
    if (dest.width(), dest.height()) != (source.width(), source.height()) {
        return Err(RegionError::DimensionMismatch {
            expected: (source.width(), source.height()),
            actual: (dest.width(), dest.height()),
        });
    }
    let roi = source.effective_roi();
    let interior = roi.shrink(1).ok_or_else(|| {
        RegionError::InvalidParameters(format!(
            "watershed needs at least 3x3 pixels, got {}x{}",
            roi.w, roi.h
        ))
    })?;
    let histo = source.histogram_in(interior)?;

    let (w, h) = (roi.w as usize, roi.h as usize);
    let channels = source.channels() as usize;
    let mut levels = vec![0u32; w * h];
    for (y, line) in levels.chunks_exact_mut(w).enumerate() {
        let row = source.row(roi.y + y as u32);
        for (x, level) in line.iter_mut().enumerate() {
            *level = row[(roi.x as usize + x) * channels + channel].to_u32();
        }
    }

    // Counting sort of the interior by level
    let mut next = Vec::with_capacity(histo.len());
    let mut total = 0usize;
    for &count in &histo {
        next.push(total);
        total += count as usize;
    }
    let mut sorted = vec![0usize; total];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = y * w + x;
            let slot = &mut next[levels[p] as usize];
            sorted[*slot] = p;
            *slot += 1;
        }
    }

    let mut labels = vec![INIT; w * h];
    labels[..w].fill(WATERSHED_BORDER);
    labels[(h - 1) * w..].fill(WATERSHED_BORDER);
    for y in 1..h - 1 {
        labels[y * w] = WATERSHED_BORDER;
        labels[y * w + w - 1] = WATERSHED_BORDER;
    }

    let mut flood = Immersion {
        levels: &levels,
        labels,
        offsets: neighbour_offsets(options.connectivity, w),
        queue: VecDeque::new(),
        basins: BasinTable::new()?,
        output: options.output,
        width: w,
        origin: (roi.x, roi.y),
    };

    let mut start = 0usize;
    for (level, &count) in histo.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let pixels = &sorted[start..start + count as usize];
        start += count as usize;
        debug_assert!(pixels.iter().all(|&p| flood.levels[p] == level as u32));
        flood.mark_level(pixels);
        flood.propagate(level as u32);
        flood.seed_basins(level as u32, pixels).inspect_err(|e| {
            tracing::warn!(error = %e, "hierarchical watershed aborted");
        })?;
    }

    let Immersion {
        labels, mut basins, ..
    } = flood;
    basins.accumulate_surfaces();

    let dest_channels = dest.channels() as usize;
    for (y, line) in labels.chunks_exact(w).enumerate() {
        let row = dest.row_mut(roi.y + y as u32);
        for (x, &label) in line.iter().enumerate() {
            row[(roi.x as usize + x) * dest_channels + dest_channel] = label;
        }
    }
    dest.set_roi(source.roi())?;

    tracing::debug!(
        basins = basins.len(),
        roots = basins.roots().count(),
        connectivity = ?options.connectivity,
        output = ?options.output,
        "hierarchical watershed"
    );
    Ok(basins)
}

/// Rebuild regions from a watershed raster after pruning.
///
/// Over the effective ROI of `watershed` (the source's ROI, as set by
/// [`hierarchical_watershed`]): border pixels become 0, contour
/// marks become positive labels, and every pixel of a discarded basin
/// takes the label of [`BasinTable::survivor_of`] that basin.
///
/// # Errors
///
/// - [`RegionError::InvalidChannels`] for a multi-channel raster without COI
/// - [`RegionError::InvalidParameters`] if a label is not in `basins`; the
///   raster is then left untouched
pub fn hierarchical_watershed_regions(
    watershed: &mut ImageMut<i16>,
    basins: &BasinTable,
) -> RegionResult<()> {
    let channel = single_channel_mut(watershed)?;
    let roi = watershed.effective_roi();
    let channels = watershed.channels() as usize;
    let columns = || (roi.x..roi.right()).map(move |x| x as usize * channels + channel);

    let mut highest = 0u16;
    for y in roi.y..roi.bottom() {
        let row = watershed.row(y);
        for i in columns() {
            if row[i] != WATERSHED_BORDER {
                highest = highest.max(row[i].unsigned_abs());
            }
        }
    }
    if highest as usize > basins.len() {
        return Err(RegionError::InvalidParameters(format!(
            "label {highest} past the basin table ({} basins)",
            basins.len()
        )));
    }

    let relabel: Vec<i16> = (0..basins.len())
        .map(|i| basins.survivor_index(i) as i16 + 1)
        .collect();
    for y in roi.y..roi.bottom() {
        let row = watershed.row_mut(y);
        for i in columns() {
            row[i] = match row[i] {
                WATERSHED_BORDER | 0 => 0,
                d => relabel[d.unsigned_abs() as usize - 1],
            };
        }
    }

    tracing::debug!(
        discarded = basins.iter().filter(|b| b.is_discarded()).count(),
        "watershed regions"
    );
    Ok(())
}

fn profile_root(flood: &[Option<usize>], mut k: usize) -> usize {
    while let Some(parent) = flood[k].filter(|&parent| parent != k) {
        k = parent;
    }
    k
}

/// One-dimensional watershed of a profile.
///
/// Returns, for every sample, 0 or, at a watershed point, the depth of the
/// shallower of the two basins it separates (the sample's value minus the
/// higher of the two minima).
///
/// # Examples
///
/// ```
/// use camellia_region::watershed::watershed_1d;
///
/// assert_eq!(watershed_1d(&[0, 5, 2, 7, 1]), vec![0, 3, 0, 6, 0]);
/// ```
pub fn watershed_1d(values: &[i32]) -> Vec<i32> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (values[i], i));

    let mut flood: Vec<Option<usize>> = vec![None; n];
    let mut result = vec![0; n];

    for p in order {
        let left = p.checked_sub(1).filter(|&l| flood[l].is_some());
        let right = Some(p + 1).filter(|&r| r < n && flood[r].is_some());
        match (left, right) {
            (None, None) => flood[p] = Some(p),
            (Some(l), None) => flood[p] = flood[l],
            (None, Some(r)) => flood[p] = flood[r],
            (Some(l), Some(r)) => {
                flood[p] = flood[r];
                let k1 = profile_root(&flood, l);
                let k2 = profile_root(&flood, r);
                if values[k1] > values[k2] {
                    result[p] = values[p] - values[k1];
                    flood[k1] = Some(k2);
                } else {
                    result[p] = values[p] - values[k2];
                    flood[k2] = Some(k1);
                }
            }
        }
    }
    result
}
