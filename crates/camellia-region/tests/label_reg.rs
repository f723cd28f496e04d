//! Connected component labeling regression test
//!
//! Checks the run-based and pixel-based labelings against a breadth-first
//! flood fill on random images, then a few geometric scenarios.
//!
//! Run with:
//! ```
//! cargo test -p camellia-region --test label_reg
//! ```

use camellia_core::{Image, ImageMut, Roi};
use camellia_region::{
    BlobTable, Classifier, RleImage, blob_analysis_first_scan, decode_blobs, encode, inverse, label,
    label_pixels, label_with_capacity,
};
use camellia_test::{RegParams, filled_disk, flood_fill_labels, random_binary, random_levels};

/// Tight bounding box and surface of every oracle label, 1-based.
fn oracle_boxes(labels: &[u32], count: u32, width: usize) -> Vec<(Roi, u32)> {
    let mut bounds = vec![(u32::MAX, u32::MAX, 0u32, 0u32, 0u32); count as usize];
    for (p, &l) in labels.iter().enumerate() {
        if l == 0 {
            continue;
        }
        let (x, y) = ((p % width) as u32, (p / width) as u32);
        let b = &mut bounds[l as usize - 1];
        b.0 = b.0.min(x);
        b.1 = b.1.min(y);
        b.2 = b.2.max(x + 1);
        b.3 = b.3.max(y + 1);
        b.4 += 1;
    }
    bounds
        .into_iter()
        .map(|(l, t, r, b, s)| (Roi::new_unchecked(l, t, r - l, b - t), s))
        .collect()
}

fn labeled(image: &Image<u8>) -> (RleImage, BlobTable) {
    let mut rle = RleImage::new(image.width(), image.height()).expect("rle");
    encode(image, Classifier::Identity, &mut rle).expect("encode");
    let blobs = label(&mut rle).expect("label");
    (rle, blobs)
}

#[test]
fn label_reg() {
    let mut rp = RegParams::new("label");

    // --- Test 1: Run labeling against flood fill ---
    eprintln!("=== Run labeling vs flood fill ===");
    let cases = [
        random_binary(64, 48, 0.3, 21).expect("random_binary"),
        random_binary(64, 48, 0.6, 22).expect("random_binary"),
        random_levels(50, 40, 3, 23).expect("random_levels"),
    ];
    for image in &cases {
        let (expected, count) = flood_fill_labels(image);
        let (rle, blobs) = labeled(image);
        eprintln!("  {} components", count);
        rp.compare_values(count as f64, blobs.len() as f64, 0.0);

        let mut decoded = ImageMut::<u32>::new(image.width(), image.height()).expect("dest");
        decode_blobs(&rle, &mut decoded, None).expect("decode_blobs");
        rp.compare_slices(&expected, decoded.data());

        let boxes = oracle_boxes(&expected, count, image.width() as usize);
        let actual: Vec<(Roi, u32)> = blobs
            .iter()
            .map(|b| (b.bounding_box(), b.surface))
            .collect();
        rp.compare_slices(&boxes, &actual);

        let total: u64 = blobs.iter().map(|b| u64::from(b.surface)).sum();
        rp.compare_values(rle.foreground_area() as f64, total as f64, 0.0);
    }

    // --- Test 2: Disk ---
    eprintln!("=== Disk ===");
    let disk = filled_disk(32, 32, 16, 16, 8).expect("disk");
    let (_, blobs) = labeled(&disk);
    rp.compare_values(1.0, blobs.len() as f64, 0.0);
    let blob = &blobs[0];
    rp.compare_values(201.0, blob.surface as f64, 10.0);
    rp.compare_values(8.0, blob.left as f64, 0.0);
    rp.compare_values(8.0, blob.top as f64, 0.0);
    rp.compare_values(17.0, blob.width as f64, 0.0);
    rp.compare_values(17.0, blob.height as f64, 0.0);
    rp.compare_values(16.0, blob.cx as f64, 0.0);
    rp.compare_values(16.0, blob.cy as f64, 0.0);
    rp.compare_values(255.0, blob.value as f64, 0.0);

    // --- Test 3: Hole inside a ring ---
    eprintln!("=== Hole ===");
    let mut ring = filled_disk(40, 40, 20, 20, 12).expect("disk").to_mut();
    ring.set_in_rect(Roi::new_unchecked(16, 16, 9, 9), 0).expect("hole");
    let ring: Image<u8> = ring.into();
    let (mut rle, blobs) = labeled(&ring);
    rp.compare_values(1.0, blobs.len() as f64, 0.0);
    inverse(&mut rle);
    let background = label(&mut rle).expect("label background");
    rp.compare_values(2.0, background.len() as f64, 0.0);
    let outside = background[0].bounding_box();
    let hole = background[1].bounding_box();
    rp.check(hole.strictly_inside(&outside), "hole inside the outside");
    rp.check(hole.strictly_inside(&blobs[0].bounding_box()), "hole inside the ring");
    rp.compare_values(81.0, background[1].surface as f64, 0.0);

    // --- Test 4: Blob capacity ---
    eprintln!("=== Blob capacity ===");
    let dots = random_binary(32, 32, 0.3, 24).expect("random_binary");
    let (_, count) = flood_fill_labels(&dots);
    let mut rle = RleImage::new(32, 32).expect("rle");
    encode(&dots, Classifier::Identity, &mut rle).expect("encode");
    rp.check(
        label_with_capacity(&mut rle, count as usize - 1).is_err(),
        "too many blobs",
    );
    rp.check(!rle.is_labeled(), "unlabeled after overflow");

    assert!(rp.cleanup());
}

#[test]
fn pixel_label_reg() {
    let mut rp = RegParams::new("pixel_label");

    // --- Test 1: Every component, background included ---
    eprintln!("=== Pixel labeling vs flood fill ===");
    for seed in [31u64, 32, 33] {
        let image = random_levels(40, 30, 4, seed).expect("random_levels");
        let (mut labels, equiv) = label_pixels(&image, 1 << 16).expect("label_pixels");
        let blobs =
            blob_analysis_first_scan(&mut labels, Some(&image), &equiv).expect("first scan");

        // Shift values so the oracle also labels zeros.
        let shifted = Image::<u16>::from_vec(
            40,
            30,
            1,
            image.data().iter().map(|&v| u16::from(v) + 1).collect(),
        )
        .expect("shifted");
        let (expected, count) = flood_fill_labels(&shifted);
        eprintln!("  seed {seed}: {count} components");
        rp.compare_values(count as f64, blobs.len() as f64, 0.0);
        rp.compare_values(count as f64, equiv.root_count() as f64, 0.0);

        let actual: Vec<u32> = labels.data().iter().map(|&l| u32::from(l) + 1).collect();
        rp.compare_slices(&expected, &actual);

        // Each component is flat, so min, max and average agree.
        rp.check(
            blobs.iter().all(|b| b.min == b.max && b.value == b.min),
            "flat components",
        );
    }

    // --- Test 2: Agreement with run labeling on binary images ---
    eprintln!("=== Pixel vs run labeling ===");
    let image = random_binary(48, 48, 0.45, 34).expect("random_binary");
    let (mut labels, equiv) = label_pixels(&image, 1 << 16).expect("label_pixels");
    let pixel_blobs =
        blob_analysis_first_scan(&mut labels, Some(&image), &equiv).expect("first scan");
    let (_, run_blobs) = labeled(&image);
    let foreground = pixel_blobs.iter().filter(|b| b.value != 0).count();
    rp.compare_values(run_blobs.len() as f64, foreground as f64, 0.0);
    let pixel_surfaces: Vec<u32> = pixel_blobs
        .iter()
        .filter(|b| b.value != 0)
        .map(|b| b.surface)
        .collect();
    let run_surfaces: Vec<u32> = run_blobs.iter().map(|b| b.surface).collect();
    rp.compare_slices(&run_surfaces, &pixel_surfaces);

    assert!(rp.cleanup());
}
