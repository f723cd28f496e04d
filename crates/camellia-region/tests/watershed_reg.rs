//! Hierarchical watershed regression test
//!
//! Floods random crater reliefs and checks the basin table for internal
//! consistency, then prunes hand-built valley reliefs and rebuilds
//! the regions.
//!
//! Run with:
//! ```
//! cargo test -p camellia-region --test watershed_reg
//! ```

use camellia_core::{Image, ImageMut, Roi};
use camellia_region::{
    BasinTable, ConnectivityType, RegionError, WATERSHED_BORDER, WatershedOptions,
    WatershedOutput, hierarchical_watershed, hierarchical_watershed_regions,
};
use camellia_test::RegParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A relief of `craters` cones: each pixel is the lowest cone value over it.
fn crater_relief(width: u32, height: u32, craters: usize, seed: u64) -> Image<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centres: Vec<(i64, i64, i64)> = (0..craters)
        .map(|_| {
            (
                rng.random_range(0..i64::from(width)),
                rng.random_range(0..i64::from(height)),
                rng.random_range(0..40),
            )
        })
        .collect();
    let data = (0..height as i64)
        .flat_map(|y| (0..width as i64).map(move |x| (x, y)))
        .map(|(x, y)| {
            centres
                .iter()
                .map(|&(cx, cy, depth)| depth + 6 * ((x - cx).abs() + (y - cy).abs()))
                .min()
                .unwrap_or(0)
                .min(255) as u8
        })
        .collect();
    Image::from_vec(width, height, 1, data).expect("relief")
}

/// Pixel count per label over the interior of a `w` x `h` raster.
fn label_counts(labels: &[i16], w: usize, h: usize, count: usize) -> Vec<u32> {
    let mut counts = vec![0u32; count];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let label = labels[y * w + x].unsigned_abs() as usize;
            if (1..=count).contains(&label) {
                counts[label - 1] += 1;
            }
        }
    }
    counts
}

/// Structural checks every basin table must pass.
fn check_table(rp: &mut RegParams, basins: &BasinTable, interior: u32) {
    let roots: Vec<usize> = basins.roots().collect();
    rp.check(!roots.is_empty(), "at least one root");
    let lowest = basins.iter().map(|b| b.minimum).min().unwrap_or(0);
    rp.check(
        roots.iter().any(|&r| basins[r].minimum == lowest),
        "a root holds the global minimum",
    );
    rp.check(
        basins.iter().all(|b| match b.flooded {
            Some(parent) => basins[parent].minimum <= b.minimum && b.dynamics.is_some(),
            None => b.dynamics.is_none(),
        }),
        "absorbed by a basin no higher",
    );
    rp.check(
        basins.iter().all(|b| b.accumulated_surface >= b.surface),
        "accumulated surface covers own surface",
    );
    let total: u32 = basins.iter().map(|b| b.surface).sum();
    rp.compare_values(interior as f64, total as f64, 0.0);
    let root_total: u32 = roots.iter().map(|&r| basins[r].accumulated_surface).sum();
    rp.compare_values(interior as f64, root_total as f64, 0.0);
}

#[test]
fn watershed_reg() {
    let mut rp = RegParams::new("watershed");

    // --- Test 1: Random reliefs ---
    eprintln!("=== Random crater reliefs ===");
    let (w, h) = (48usize, 40usize);
    let interior = ((w - 2) * (h - 2)) as u32;
    for (seed, connectivity) in [
        (51u64, ConnectivityType::FourWay),
        (52, ConnectivityType::FourWay),
        (53, ConnectivityType::EightWay),
    ] {
        let relief = crater_relief(w as u32, h as u32, 12, seed);
        let mut labels = ImageMut::<i16>::new(w as u32, h as u32).expect("labels");
        let options = WatershedOptions::new().with_connectivity(connectivity);
        let basins = hierarchical_watershed(&relief, &mut labels, &options).expect("watershed");
        eprintln!(
            "  seed {seed}: {} basins, {} roots",
            basins.len(),
            basins.roots().count()
        );
        check_table(&mut rp, &basins, interior);
        // A connected interior floods into a single tree.
        rp.compare_values(1.0, basins.roots().count() as f64, 0.0);

        let data = labels.data();
        let counts = label_counts(data, w, h, basins.len());
        let surfaces: Vec<u32> = basins.iter().map(|b| b.surface).collect();
        rp.compare_slices(&surfaces, &counts);
        rp.check(
            (0..w).all(|x| data[x] == WATERSHED_BORDER && data[(h - 1) * w + x] == WATERSHED_BORDER),
            "border ring",
        );
        rp.check(
            basins.iter().enumerate().all(|(i, b)| {
                relief.get_pixel(b.x, b.y) == Some(b.minimum as u8)
                    && labels.get_pixel(b.x, b.y) == Some(i as i16 + 1)
            }),
            "basin minima are seeds",
        );

        // Pruning keeps the pixel count of every surviving region.
        let mut pruned = basins.clone();
        let discarded = pruned.prune_by_dynamics(10);
        let mut regions = labels;
        hierarchical_watershed_regions(&mut regions, &pruned).expect("regions");
        let mut expected = vec![0u32; basins.len()];
        for (i, basin) in basins.iter().enumerate() {
            if let Some(survivor) = pruned.survivor_of(i) {
                expected[survivor] += basin.surface;
            }
        }
        let counts = label_counts(regions.data(), w, h, basins.len());
        rp.compare_slices(&expected, &counts);
        let survivors = counts.iter().filter(|&&c| c > 0).count();
        rp.compare_values((basins.len() - discarded) as f64, survivors as f64, 0.0);
    }

    assert!(rp.cleanup());
}

/// 15x5: three valleys along each interior row, minima 0, 5 and 1.
fn three_valleys() -> Image<u8> {
    let profile = [9u8, 0, 1, 2, 8, 5, 6, 9, 3, 1, 2, 4, 6, 7, 9];
    let data = (0..5).flat_map(|_| profile).collect();
    Image::from_vec(15, 5, 1, data).expect("relief")
}

#[test]
fn watershed_pruning_reg() {
    let mut rp = RegParams::new("watershed_pruning");
    let relief = three_valleys();

    // --- Test 1: Dendrogram ---
    eprintln!("=== Dendrogram ===");
    let mut labels = ImageMut::<i16>::new(15, 5).expect("labels");
    let mut basins =
        hierarchical_watershed(&relief, &mut labels, &WatershedOptions::default()).expect("watershed");
    rp.compare_values(3.0, basins.len() as f64, 0.0);
    let minima: Vec<u32> = basins.iter().map(|b| b.minimum).collect();
    rp.compare_slices(&[0, 1, 5], &minima);
    let dynamics: Vec<Option<u32>> = basins.iter().map(|b| b.dynamics).collect();
    rp.compare_slices(&[None, Some(8), Some(3)], &dynamics);
    let flooded: Vec<Option<usize>> = basins.iter().map(|b| b.flooded).collect();
    rp.compare_slices(&[None, Some(0), Some(0)], &flooded);
    rp.compare_values(39.0, basins[0].accumulated_surface as f64, 0.0);
    check_table(&mut rp, &basins, 39);

    // --- Test 2: Prune the shallow middle valley ---
    eprintln!("=== Pruning ===");
    rp.compare_values(1.0, basins.prune_by_dynamics(5) as f64, 0.0);
    rp.check(basins[2].is_discarded(), "middle valley discarded");
    rp.check(basins.survivor_of(2) == Some(0), "middle valley survives as the left one");
    hierarchical_watershed_regions(&mut labels, &basins).expect("regions");
    let data = labels.data();
    rp.check(data.iter().all(|&l| l != 3), "no pixel keeps the pruned label");
    for y in 1..4 {
        let row = &data[y * 15..(y + 1) * 15];
        rp.compare_slices(&[0, 1, 1, 1, 1, 1, 1], &row[..7]);
        rp.check(row[7] == 1 || row[7] == 2, "ridge pixel in a neighbour region");
        rp.compare_slices(&[2, 2, 2, 2, 2, 2, 0], &row[8..]);
    }
    rp.check(data[..15].iter().all(|&l| l == 0), "border cleared");

    // --- Test 3: Contours ---
    eprintln!("=== Contours ===");
    let mut contours = ImageMut::<i16>::new(15, 5).expect("labels");
    let options = WatershedOptions::new().with_output(WatershedOutput::Contours);
    let basins = hierarchical_watershed(&relief, &mut contours, &options).expect("watershed");
    let data = contours.data();
    for y in 1..4 {
        let row = &data[y * 15..(y + 1) * 15];
        let lines: Vec<usize> = (1..14).filter(|&x| row[x] < 0).collect();
        rp.compare_slices(&[4, 7], &lines);
    }
    // Marks carry the absorbed side: the middle valley at x = 4, the right
    // valley at x = 7 while it still has its own root, then the middle
    // valley again once both share the left root.
    rp.compare_values(-3.0, data[15 + 4] as f64, 0.0);
    rp.compare_values(-2.0, data[15 + 7] as f64, 0.0);
    rp.compare_values(-3.0, data[2 * 15 + 4] as f64, 0.0);
    rp.compare_values(-3.0, data[2 * 15 + 7] as f64, 0.0);
    hierarchical_watershed_regions(&mut contours, &basins).expect("regions");
    rp.check(
        contours.data().iter().all(|&l| (0..=3).contains(&l)),
        "contour marks become labels",
    );

    // --- Test 4: ROI ---
    eprintln!("=== ROI ===");
    let mut framed = relief.to_mut();
    framed.set_roi(Some(Roi::new_unchecked(3, 0, 7, 5))).expect("roi");
    let framed: Image<u8> = framed.into();
    let mut labels = ImageMut::<i16>::new(15, 5).expect("labels");
    labels.fill(99);
    let basins = hierarchical_watershed(&framed, &mut labels, &WatershedOptions::default())
        .expect("watershed");
    rp.compare_values(2.0, basins.len() as f64, 0.0);
    rp.compare_values(99.0, labels.get_pixel(0, 2).unwrap_or(0) as f64, 0.0);
    rp.check(
        labels.get_pixel(3, 2) == Some(WATERSHED_BORDER),
        "border ring at the ROI edge",
    );
    rp.compare_values(8.0, basins[0].x as f64, 0.0);
    rp.compare_values(1.0, basins[0].y as f64, 0.0);
    rp.check(
        labels.roi() == Some(Roi::new_unchecked(3, 0, 7, 5)),
        "labels take the source ROI",
    );
    hierarchical_watershed_regions(&mut labels, &basins).expect("regions in ROI");
    rp.compare_values(99.0, labels.get_pixel(0, 2).unwrap_or(0) as f64, 0.0);
    rp.compare_values(0.0, labels.get_pixel(3, 2).unwrap_or(99) as f64, 0.0);

    assert!(rp.cleanup());
}

/// 11x3: five valleys on the single interior row, minima 0 to 40.
fn five_valleys() -> Image<u8> {
    let profile = [255u8, 0, 100, 10, 60, 20, 120, 30, 80, 40, 255];
    let data = (0..3).flat_map(|_| profile).collect();
    Image::from_vec(11, 3, 1, data).expect("relief")
}

/// Regions of the interior row after discarding the basins in `discarded`.
fn five_valley_row(discarded: &[usize]) -> Vec<i16> {
    let relief = five_valleys();
    let mut labels = ImageMut::<i16>::new(11, 3).expect("labels");
    let mut basins =
        hierarchical_watershed(&relief, &mut labels, &WatershedOptions::default()).expect("watershed");
    for &index in discarded {
        basins.discard(index).expect("discard");
    }
    hierarchical_watershed_regions(&mut labels, &basins).expect("regions");
    labels.row(1).to_vec()
}

#[test]
fn watershed_dendrogram_reg() {
    let mut rp = RegParams::new("watershed_dendrogram");

    // --- Test 1: Five basins ---
    eprintln!("=== Five basins ===");
    let relief = five_valleys();
    let mut labels = ImageMut::<i16>::new(11, 3).expect("labels");
    let mut basins =
        hierarchical_watershed(&relief, &mut labels, &WatershedOptions::default()).expect("watershed");
    rp.compare_values(5.0, basins.len() as f64, 0.0);
    let dynamics: Vec<Option<u32>> = basins.iter().map(|b| b.dynamics).collect();
    rp.compare_slices(&[None, Some(90), Some(40), Some(90), Some(40)], &dynamics);
    let flooded: Vec<Option<usize>> = basins.iter().map(|b| b.flooded).collect();
    rp.compare_slices(&[None, Some(0), Some(1), Some(0), Some(3)], &flooded);
    let accumulated: Vec<u32> = basins.iter().map(|b| b.accumulated_surface).collect();
    rp.compare_slices(&[9, 4, 2, 3, 1], &accumulated);
    hierarchical_watershed_regions(&mut labels, &basins).expect("regions");
    rp.compare_slices(&[0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 0], labels.row(1));

    // --- Test 2: Discarding one basin ---
    eprintln!("=== Discard basin 3 ===");
    rp.compare_slices(&[0, 1, 1, 2, 2, 2, 2, 4, 4, 5, 0], &five_valley_row(&[2]));

    // --- Test 3: Transitive reassignment ---
    eprintln!("=== Discard basins 2 and 3 ===");
    rp.compare_slices(&[0, 1, 1, 1, 1, 1, 1, 4, 4, 5, 0], &five_valley_row(&[1, 2]));

    // --- Test 4: Pruning by dynamics ---
    eprintln!("=== Prune by dynamics ===");
    rp.compare_values(2.0, basins.prune_by_dynamics(50) as f64, 0.0);
    let kept: Vec<usize> = (0..basins.len()).filter(|&i| !basins[i].is_discarded()).collect();
    rp.compare_slices(&[0, 1, 3], &kept);
    rp.check(basins.survivor_of(4) == Some(3), "pruned chain ends at basin 3");
    rp.check(basins.survivor_of(5).is_none(), "survivor out of range");
    rp.check(basins.discard(5).is_err(), "discard out of range");

    assert!(rp.cleanup());
}

#[test]
fn watershed_capacity_reg() {
    let mut rp = RegParams::new("watershed_capacity");

    // Every dark pixel of a checkerboard is its own 4-connected minimum.
    let (w, h) = (260u32, 260u32);
    let data = (0..h)
        .flat_map(|y| (0..w).map(move |x| ((x + y) % 2) as u8))
        .collect();
    let board = Image::<u8>::from_vec(w, h, 1, data).expect("board");
    let mut labels = ImageMut::<i16>::new(w, h).expect("labels");
    let result = hierarchical_watershed(&board, &mut labels, &WatershedOptions::default());
    rp.check(
        matches!(result, Err(RegionError::BasinCapacityExceeded { .. })),
        "basin capacity exceeded",
    );

    // Too small to have an interior
    let tiny = Image::<u8>::new(2, 8).expect("tiny");
    let mut labels = ImageMut::<i16>::new(2, 8).expect("labels");
    rp.check(
        hierarchical_watershed(&tiny, &mut labels, &WatershedOptions::default()).is_err(),
        "2-pixel-wide image rejected",
    );

    assert!(rp.cleanup());
}
