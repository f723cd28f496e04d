//! Lookup tables
//!
//! A [`Lut`] maps sample values (or blob indices) to output values. It is
//! used by the RLE encoder to classify pixels and by the decoders to
//! recolor runs or blobs.

use crate::error::{Error, Result};

/// A lookup table of `u32` entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    table: Vec<u32>,
}

impl Lut {
    /// Create a LUT from its entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `table` is empty.
    pub fn new(table: Vec<u32>) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidParameter("empty lookup table".into()));
        }
        Ok(Self { table })
    }

    /// The identity LUT over `len` entries.
    pub fn identity(len: usize) -> Self {
        Self {
            table: (0..len).map(|i| i as u32).collect(),
        }
    }

    /// A LUT over `len` entries built from a function of the index.
    pub fn from_fn(len: usize, f: impl FnMut(usize) -> u32) -> Self {
        Self {
            table: (0..len).map(f).collect(),
        }
    }

    /// A binarizing LUT for `depth`-bit samples: `v >= threshold` maps to 1.
    pub fn threshold(depth: u32, threshold: u32) -> Self {
        Self::from_fn(1usize << depth, |v| u32::from(v as u32 >= threshold))
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the LUT has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Get entry `index`, or `None` if out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.table.get(index).copied()
    }

    /// Get entry `index`, or 0 if out of range.
    #[inline]
    pub fn lookup(&self, index: usize) -> u32 {
        self.get(index).unwrap_or(0)
    }

    /// Set entry `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index >= len`.
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        let len = self.table.len();
        let slot = self
            .table
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Get the entries.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_basic() {
        let mut lut = Lut::identity(4);
        assert_eq!(lut.len(), 4);
        assert_eq!(lut.get(3), Some(3));
        assert_eq!(lut.get(4), None);
        assert_eq!(lut.lookup(9), 0);
        lut.set(1, 42).unwrap();
        assert_eq!(lut.as_slice(), &[0, 42, 2, 3]);
        assert!(lut.set(4, 0).is_err());
        assert!(Lut::new(Vec::new()).is_err());
    }

    #[test]
    fn test_lut_threshold() {
        let lut = Lut::threshold(8, 128);
        assert_eq!(lut.len(), 256);
        assert_eq!(lut.lookup(127), 0);
        assert_eq!(lut.lookup(128), 1);
        assert_eq!(lut.lookup(255), 1);
    }
}
