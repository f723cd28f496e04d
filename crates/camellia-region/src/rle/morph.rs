//! Run-domain erosion
//!
//! Grey-level erosion (minimum over a structuring element) computed
//! directly on runs. Each output line is the horizontal and vertical
//! minimum of at most three input lines; lines are handled as lists of
//! `(value, length)` segments, so the cost is proportional to the number
//! of runs, not pixels.
//!
//! Pixels outside the image do not take part in the minimum, so image
//! borders do not erode.

use super::RleImage;
use crate::error::{RegionError, RegionResult};

/// Structuring elements supported by [`erode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructuringElement {
    /// The pixel and its 4 neighbours
    #[default]
    Cross,
    /// The full 3x3 square around the pixel
    Square3x3,
    /// 3 columns wide, the pixel's line and the line above
    Rect3x2,
}

type Segments = Vec<(u32, u32)>;

fn push_segment(out: &mut Segments, value: u32, length: u32) {
    if length == 0 {
        return;
    }
    match out.last_mut() {
        Some(last) if last.0 == value => last.1 += length,
        _ => out.push((value, length)),
    }
}

/// Pixel-wise minimum of two lines of equal width.
fn min_merge(a: &[(u32, u32)], b: &[(u32, u32)]) -> Segments {
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    let mut left_a = a.first().map_or(0, |s| s.1);
    let mut left_b = b.first().map_or(0, |s| s.1);
    while i < a.len() && j < b.len() {
        let step = left_a.min(left_b);
        push_segment(&mut out, a[i].0.min(b[j].0), step);
        left_a -= step;
        left_b -= step;
        if left_a == 0 {
            i += 1;
            left_a = a.get(i).map_or(0, |s| s.1);
        }
        if left_b == 0 {
            j += 1;
            left_b = b.get(j).map_or(0, |s| s.1);
        }
    }
    out
}

/// Minimum over the 1x3 window centred on each pixel.
///
/// Only the first and last pixel of a segment see a neighbouring segment.
fn erode_horizontal(line: &[(u32, u32)]) -> Segments {
    let mut out = Vec::with_capacity(line.len() + 2);
    for (i, &(value, length)) in line.iter().enumerate() {
        let left = match i.checked_sub(1) {
            Some(p) => line[p].0.min(value),
            None => value,
        };
        let right = line.get(i + 1).map_or(value, |n| n.0.min(value));
        if length == 1 {
            push_segment(&mut out, left.min(right), 1);
        } else {
            push_segment(&mut out, left, 1);
            push_segment(&mut out, value, length - 2);
            push_segment(&mut out, right, 1);
        }
    }
    out
}

/// Erode a run table into `dest`.
///
/// The output runs are joined, so `dest` is a proper run table of the same
/// size as `src`, unlabeled, each run's `blob` being its own index.
///
/// # Errors
///
/// - [`RegionError::EmptyImage`] if `src` holds no runs
/// - [`RegionError::InvalidParameters`] if `src` does not cover every line
/// - [`RegionError::RunCapacityExceeded`] if `dest` is too small; `dest` is
///   left empty with its capacity doubled
pub fn erode(
    src: &RleImage,
    dest: &mut RleImage,
    element: StructuringElement,
) -> RegionResult<()> {
    if src.is_empty() {
        return Err(RegionError::EmptyImage);
    }
    let lines: Vec<Segments> = src
        .lines()
        .map(|line| line.iter().map(|r| (r.value, r.length)).collect())
        .collect();
    if lines.len() != src.height() as usize {
        return Err(RegionError::InvalidParameters(format!(
            "run table covers {} of {} lines",
            lines.len(),
            src.height()
        )));
    }

    dest.begin(src.width(), src.height());
    for (y, center) in lines.iter().enumerate() {
        let above = y.checked_sub(1).map(|p| &lines[p]);
        let below = lines.get(y + 1);
        let eroded = match element {
            StructuringElement::Cross => {
                let mut out = erode_horizontal(center);
                for neighbour in [above, below].into_iter().flatten() {
                    out = min_merge(&out, neighbour);
                }
                out
            }
            StructuringElement::Square3x3 => {
                let mut column = center.clone();
                for neighbour in [above, below].into_iter().flatten() {
                    column = min_merge(&column, neighbour);
                }
                erode_horizontal(&column)
            }
            StructuringElement::Rect3x2 => match above {
                Some(above) => erode_horizontal(&min_merge(center, above)),
                None => erode_horizontal(center),
            },
        };
        for (value, length) in eroded {
            dest.push_joined(value, length, y as u32)?;
        }
    }

    tracing::debug!(
        ?element,
        before = src.len(),
        after = dest.len(),
        "rle erode"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rle::{Classifier, decode, encode};
    use camellia_core::{Image, ImageMut};

    fn encode_u8(width: u32, height: u32, values: Vec<u8>) -> RleImage {
        let image = Image::from_vec(width, height, 1, values).unwrap();
        let mut rle = RleImage::new(width, height).unwrap();
        encode(&image, Classifier::Identity, &mut rle).unwrap();
        rle
    }

    /// Pixel-domain reference erosion, outside pixels ignored.
    fn erode_reference(
        width: u32,
        height: u32,
        values: &[u8],
        offsets: &[(i32, i32)],
    ) -> Vec<u8> {
        let mut out = vec![0u8; values.len()];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut m = u8::MAX;
                for &(dx, dy) in offsets {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < width as i32 && ny < height as i32 {
                        m = m.min(values[(ny * width as i32 + nx) as usize]);
                    }
                }
                out[(y * width as i32 + x) as usize] = m;
            }
        }
        out
    }

    fn check(element: StructuringElement, offsets: &[(i32, i32)]) {
        let (width, height) = (7, 6);
        let values: Vec<u8> = (0..width * height)
            .map(|i| ((i * 37 + i / 5) % 4) as u8)
            .collect();
        let src = encode_u8(width, height, values.clone());
        let mut dest = RleImage::new(width, height).unwrap();
        erode(&src, &mut dest, element).unwrap();
        assert!(dest.is_well_formed());

        let mut out = ImageMut::<u8>::new(width, height).unwrap();
        decode(&dest, &mut out, None).unwrap();
        assert_eq!(
            out.data(),
            erode_reference(width, height, &values, offsets).as_slice()
        );
    }

    #[test]
    fn test_erode_cross() {
        check(
            StructuringElement::Cross,
            &[(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
        );
    }

    #[test]
    fn test_erode_square() {
        let offsets: Vec<(i32, i32)> = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .collect();
        check(StructuringElement::Square3x3, &offsets);
    }

    #[test]
    fn test_erode_rect3x2() {
        let offsets: Vec<(i32, i32)> = (-1..=0)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .collect();
        check(StructuringElement::Rect3x2, &offsets);
    }

    #[test]
    fn test_erode_binary_square_shrinks_block() {
        let mut values = vec![0u8; 64];
        for y in 2..6 {
            for x in 2..6 {
                values[y * 8 + x] = 1;
            }
        }
        let src = encode_u8(8, 8, values);
        let mut dest = RleImage::new(8, 8).unwrap();
        erode(&src, &mut dest, StructuringElement::Square3x3).unwrap();
        assert_eq!(dest.foreground_area(), 4);
    }

    #[test]
    fn test_erode_capacity_exceeded() {
        let src = encode_u8(4, 1, vec![0, 1, 1, 0]);
        let mut dest = RleImage::with_capacity(4, 1, 1).unwrap();
        erode(&src, &mut dest, StructuringElement::Cross).unwrap();
        assert_eq!(dest.len(), 1);

        let src = encode_u8(5, 1, vec![3, 3, 2, 2, 2]);
        let mut dest = RleImage::with_capacity(5, 1, 1).unwrap();
        assert!(matches!(
            erode(&src, &mut dest, StructuringElement::Cross),
            Err(RegionError::RunCapacityExceeded { capacity: 1 })
        ));
        assert_eq!(dest.capacity(), 2);
    }
}
