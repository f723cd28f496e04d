//! Synthetic test images and reference implementations
//!
//! Generators are deterministic: random images take an explicit seed.

use crate::error::{TestError, TestResult};
use camellia_core::{Image, Pixel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// An 8-bit image holding a filled disk of value 255 on a 0 background.
///
/// A pixel is inside when its squared distance to (`cx`, `cy`) is at most
/// `radius²`.
pub fn filled_disk(width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> TestResult<Image<u8>> {
    let r2 = i64::from(radius) * i64::from(radius);
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let dx = i64::from(x) - i64::from(cx);
            let dy = i64::from(y) - i64::from(cy);
            if dx * dx + dy * dy <= r2 { 255 } else { 0 }
        })
        .collect();
    Ok(Image::from_vec(width, height, 1, data)?)
}

/// A binary (0 / 1) image, each pixel set with probability `density`.
///
/// # Errors
///
/// Returns [`TestError::InvalidParameter`] unless `0 <= density <= 1`.
pub fn random_binary(width: u32, height: u32, density: f64, seed: u64) -> TestResult<Image<u8>> {
    if !(0.0..=1.0).contains(&density) {
        return Err(TestError::InvalidParameter(format!(
            "density {density} not in [0, 1]"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .map(|_| u8::from(rng.random_bool(density)))
        .collect();
    Ok(Image::from_vec(width, height, 1, data)?)
}

/// An 8-bit image of uniformly random values in `0..levels`.
///
/// # Errors
///
/// Returns [`TestError::InvalidParameter`] unless `1 <= levels <= 256`.
pub fn random_levels(width: u32, height: u32, levels: u32, seed: u64) -> TestResult<Image<u8>> {
    if levels == 0 || levels > 256 {
        return Err(TestError::InvalidParameter(format!(
            "levels {levels} not in 1..=256"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .map(|_| rng.random_range(0..levels) as u8)
        .collect();
    Ok(Image::from_vec(width, height, 1, data)?)
}

/// Reference labeling by breadth-first flood fill.
///
/// Labels 4-connected components of equal non-zero values of channel 0,
/// numbered from 1 in raster order of their first pixel; background
/// pixels get 0. Returns the labels and the number of components.
pub fn flood_fill_labels<T: Pixel>(image: &Image<T>) -> (Vec<u32>, u32) {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let channels = image.channels() as usize;
    let value = |p: usize| image.data()[p * channels];
    let mut labels = vec![0u32; w * h];
    let mut count = 0;
    let mut queue = VecDeque::new();

    for start in 0..w * h {
        if labels[start] != 0 || value(start) == T::default() {
            continue;
        }
        count += 1;
        labels[start] = count;
        queue.push_back(start);
        while let Some(p) = queue.pop_front() {
            let (x, y) = (p % w, p / w);
            let neighbours = [
                (y > 0).then(|| p - w),
                (x > 0).then(|| p - 1),
                (x + 1 < w).then(|| p + 1),
                (y + 1 < h).then(|| p + w),
            ];
            for q in neighbours.into_iter().flatten() {
                if labels[q] == 0 && value(q) == value(p) {
                    labels[q] = count;
                    queue.push_back(q);
                }
            }
        }
    }
    (labels, count)
}
