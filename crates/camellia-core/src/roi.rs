//! Roi - Rectangular regions of interest
//!
//! A region of interest restricts an operation to a sub-rectangle of an
//! image. Coordinates are unsigned because a ROI always lies inside the
//! image it is attached to.

use crate::error::{Error, Result};

/// A rectangle region of interest
///
/// Small and frequently copied, so it is a plain `Copy` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Roi {
    /// Left x coordinate
    pub x: u32,
    /// Top y coordinate
    pub y: u32,
    /// Width
    pub w: u32,
    /// Height
    pub h: u32,
}

impl Roi {
    /// Create a new ROI
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if the rectangle is empty.
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Result<Self> {
        if w == 0 || h == 0 {
            return Err(Error::InvalidDimension {
                width: w,
                height: h,
            });
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a ROI without validation
    pub const fn new_unchecked(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// ROI covering a whole `width` x `height` image
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Get the area
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Check if the ROI is empty (zero area)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check if a point is inside the ROI
    #[inline]
    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if this ROI contains another one
    pub fn contains(&self, other: &Roi) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if this ROI lies strictly inside another, touching none of its edges
    pub fn strictly_inside(&self, other: &Roi) -> bool {
        self.x > other.x
            && self.y > other.y
            && self.right() < other.right()
            && self.bottom() < other.bottom()
    }

    /// Check whether the ROI fits inside a `width` x `height` image
    pub fn fits(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= width && self.bottom() <= height
    }

    /// Compute the intersection of two ROIs
    pub fn intersect(&self, other: &Roi) -> Option<Roi> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Roi {
                x,
                y,
                w: right - x,
                h: bottom - y,
            })
        } else {
            None
        }
    }

    /// Compute the bounding ROI of two ROIs
    pub fn union(&self, other: &Roi) -> Roi {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Roi {
            x,
            y,
            w: right - x,
            h: bottom - y,
        }
    }

    /// Shrink the ROI by `margin` pixels on every side
    ///
    /// Returns `None` when nothing is left.
    pub fn shrink(&self, margin: u32) -> Option<Roi> {
        let both = margin.checked_mul(2)?;
        let w = self.w.checked_sub(both)?;
        let h = self.h.checked_sub(both)?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(Roi {
            x: self.x + margin,
            y: self.y + margin,
            w,
            h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_creation() {
        let roi = Roi::new(2, 3, 10, 20).unwrap();
        assert_eq!(roi.right(), 12);
        assert_eq!(roi.bottom(), 23);
        assert_eq!(roi.area(), 200);
        assert!(Roi::new(0, 0, 0, 5).is_err());
    }

    #[test]
    fn test_roi_contains() {
        let outer = Roi::new_unchecked(0, 0, 10, 10);
        let inner = Roi::new_unchecked(2, 2, 3, 3);
        assert!(outer.contains(&inner));
        assert!(inner.strictly_inside(&outer));
        assert!(!outer.strictly_inside(&outer));
        assert!(outer.contains_point(9, 9));
        assert!(!outer.contains_point(10, 0));
    }

    #[test]
    fn test_roi_intersect_union() {
        let a = Roi::new_unchecked(0, 0, 5, 5);
        let b = Roi::new_unchecked(3, 3, 5, 5);
        assert_eq!(a.intersect(&b), Some(Roi::new_unchecked(3, 3, 2, 2)));
        assert_eq!(a.union(&b), Roi::new_unchecked(0, 0, 8, 8));
        let c = Roi::new_unchecked(6, 6, 1, 1);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_roi_shrink() {
        let roi = Roi::full(5, 4);
        assert_eq!(roi.shrink(1), Some(Roi::new_unchecked(1, 1, 3, 2)));
        assert_eq!(roi.shrink(2), None);
    }

    #[test]
    fn test_roi_fits() {
        assert!(Roi::new_unchecked(1, 1, 4, 4).fits(5, 5));
        assert!(!Roi::new_unchecked(1, 1, 5, 4).fits(5, 5));
    }
}
