//! Pixel channel depths.
//!
//! A region's buffer is generic over its channel type; the full-scale value
//! and storage width are associated constants, so depth is resolved at
//! compile time.

/// One color channel of a stored pixel.
pub trait Channel: Copy + Default + PartialEq + PartialOrd + Send + Sync + std::fmt::Debug + 'static {
    /// Full-scale channel value ("depth").
    const MAX: Self;

    /// Bits per stored channel value.
    const STORAGE_BITS: u32;

    /// Convert from `f64`, saturating at the type's range.
    fn from_f64(v: f64) -> Self;

    fn to_f64(self) -> f64;

    /// [`MAX`](Self::MAX) as `f64`.
    #[inline]
    fn depth() -> f64 {
        Self::MAX.to_f64()
    }

    /// Channel value scaled into `[0, 1]`.
    #[inline]
    fn to_unit(self) -> f64 {
        (self.to_f64() / Self::depth()).clamp(0.0, 1.0)
    }
}

impl Channel for u8 {
    const MAX: Self = u8::MAX;
    const STORAGE_BITS: u32 = 8;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as u8
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Channel for u16 {
    const MAX: Self = u16::MAX;
    const STORAGE_BITS: u32 = 16;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as u16
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Floating-point channels are normalised: full scale is `1.0`.
impl Channel for f32 {
    const MAX: Self = 1.0;
    const STORAGE_BITS: u32 = 32;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}
