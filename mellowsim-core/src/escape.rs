use crate::complex::Complex;
use crate::error::CoreError;

/// Smallest bailout radius. Anything below 2 would misclassify escaping orbits.
pub const MIN_ESCAPE_RADIUS: f64 = 2.0;

/// Validate a bailout radius.
pub fn validate_escape_radius(escape_radius: f64) -> crate::Result<()> {
    if !escape_radius.is_finite() || escape_radius < MIN_ESCAPE_RADIUS {
        return Err(CoreError::InvalidEscapeRadius(escape_radius));
    }
    Ok(())
}

/// Validate a squared escape radius handed directly to a backend.
pub fn validate_escape_radius_sq(escape_radius_sq: f64) -> crate::Result<()> {
    if !escape_radius_sq.is_finite() || escape_radius_sq < MIN_ESCAPE_RADIUS * MIN_ESCAPE_RADIUS {
        return Err(CoreError::InvalidEscapeRadius(escape_radius_sq.sqrt()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-pixel state
// ---------------------------------------------------------------------------

/// Where a single pixel's orbit stands after some number of iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelState {
    /// Still bounded after `iterations` steps; `z` is the last value.
    Pending { z: Complex, iterations: u32 },

    /// Reached `|z|² >= escape_radius²` after `iterations` steps.
    Escaped { z: Complex, iterations: u32 },

    /// Inside the main cardioid or the period-2 bulb. Never escapes, so it is
    /// never iterated.
    Interior,
}

impl PixelState {
    /// Initial state for a cold computation of `c`.
    #[inline]
    pub fn start(c: Complex) -> Self {
        if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
            Self::Interior
        } else {
            Self::Pending {
                z: Complex::ZERO,
                iterations: 0,
            }
        }
    }

    /// Reported iteration count: the escape iteration, or `0` for a pixel
    /// that has not escaped within the budget.
    #[inline]
    pub fn count(&self) -> u32 {
        match self {
            Self::Escaped { iterations, .. } => *iterations,
            Self::Pending { .. } | Self::Interior => 0,
        }
    }

    #[inline]
    pub fn is_escaped(&self) -> bool {
        matches!(self, Self::Escaped { .. })
    }

    /// Iterate `z ← z² + c` until escape or until `max_iter` total steps.
    ///
    /// Resuming a `Pending` state from budget `b1` to `b2` performs exactly
    /// the arithmetic a cold run to `b2` would, so both paths agree on every
    /// pixel.
    #[inline]
    pub fn advance(self, c: Complex, max_iter: u32, escape_radius_sq: f64) -> Self {
        let (mut z, mut iterations) = match self {
            Self::Pending { z, iterations } => (z, iterations),
            done => return done,
        };
        while iterations < max_iter {
            if z.norm_sq() >= escape_radius_sq {
                return Self::Escaped { z, iterations };
            }
            z = z.square_add(c);
            iterations += 1;
        }
        if z.norm_sq() >= escape_radius_sq {
            Self::Escaped { z, iterations }
        } else {
            Self::Pending { z, iterations }
        }
    }
}

/// Closed-form membership test for the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

/// Advance a contiguous run of pixels in place.
///
/// `first_index` is the row-major index of `pixels[0]` in the full grid;
/// `c` for each pixel comes from the separable sample arrays.
pub fn advance_block(
    real: &[f64],
    imag: &[f64],
    first_index: usize,
    pixels: &mut [PixelState],
    counts: &mut [u32],
    max_iter: u32,
    escape_radius_sq: f64,
) {
    debug_assert_eq!(pixels.len(), counts.len());
    let width = real.len();
    for (offset, (pixel, count)) in pixels.iter_mut().zip(counts.iter_mut()).enumerate() {
        let index = first_index + offset;
        let c = Complex::new(real[index % width], imag[index / width]);
        *pixel = pixel.advance(c, max_iter, escape_radius_sq);
        *count = pixel.count();
    }
}
