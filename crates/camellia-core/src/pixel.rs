//! Pixel sample types
//!
//! Every algorithm in the workspace is written once, generic over the
//! [`Pixel`] trait, instead of once per storage width. The trait exposes
//! the storage width, signedness and lossless widening to `i64`.

use std::fmt::Debug;

/// An integer pixel sample
pub trait Pixel: Copy + Default + PartialEq + PartialOrd + Debug + Send + Sync + 'static {
    /// Storage width in bits
    const BITS: u32;
    /// Whether the storage type is signed
    const SIGNED: bool;
    /// Smallest representable sample
    const MIN: Self;
    /// Largest representable sample
    const MAX: Self;

    /// Widen to `i64` without loss.
    fn to_i64(self) -> i64;

    /// Narrow from `i64`, clamping to the representable range.
    fn saturating_from_i64(value: i64) -> Self;

    /// Widen an unsigned sample to `u32`.
    ///
    /// Negative samples of signed types clamp to 0.
    #[inline]
    fn to_u32(self) -> u32 {
        self.to_i64().clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Narrow from `u32`, clamping to the representable range.
    #[inline]
    fn saturating_from_u32(value: u32) -> Self {
        Self::saturating_from_i64(i64::from(value))
    }
}

macro_rules! impl_pixel {
    ($($t:ty => $signed:expr),* $(,)?) => {
        $(
            impl Pixel for $t {
                const BITS: u32 = <$t>::BITS;
                const SIGNED: bool = $signed;
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;

                #[inline]
                fn to_i64(self) -> i64 {
                    i64::from(self)
                }

                #[inline]
                fn saturating_from_i64(value: i64) -> Self {
                    value.clamp(i64::from(<$t>::MIN), i64::from(<$t>::MAX)) as $t
                }
            }
        )*
    };
}

impl_pixel!(u8 => false, u16 => false, u32 => false, i8 => true, i16 => true, i32 => true);
