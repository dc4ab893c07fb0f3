use crate::complex::Complex;
use crate::error::{ComputeError, CoreError};
use crate::escape::{validate_escape_radius_sq, PixelState};

/// Resumable per-pixel iteration state for one region.
///
/// Holds the separable sample arrays alongside the pixels so a warm step
/// needs nothing but the state and the new budget. Opaque to the renderer:
/// only backends read or produce the pixel states.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationState {
    real: Vec<f64>,
    imag: Vec<f64>,
    escape_radius_sq: f64,
    max_iter: u32,
    pixels: Vec<PixelState>,
}

impl ContinuationState {
    /// Validate a cold request and build the starting pixel states.
    ///
    /// `max_iter` is the budget the caller is about to run; it is recorded
    /// when the backend hands the state back via [`with_pixels`](Self::with_pixels).
    pub fn cold(
        real: &[f64],
        imag: &[f64],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> crate::Result<Self> {
        if max_iter < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iter));
        }
        if real.is_empty() || imag.is_empty() {
            return Err(CoreError::InvalidSamples {
                reason: format!("need at least one sample per axis, got {}×{}", real.len(), imag.len()),
            });
        }
        if real.iter().chain(imag.iter()).any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidSamples {
                reason: "samples must be finite".into(),
            });
        }
        validate_escape_radius_sq(escape_radius_sq)?;

        let mut pixels = Vec::with_capacity(real.len() * imag.len());
        for &im in imag {
            for &re in real {
                pixels.push(PixelState::start(Complex::new(re, im)));
            }
        }
        Ok(Self {
            real: real.to_vec(),
            imag: imag.to_vec(),
            escape_radius_sq,
            max_iter: 0,
            pixels,
        })
    }

    /// Check that this state may be resumed up to `new_max_iter`.
    pub fn check_resume(&self, new_max_iter: u32) -> Result<(), ComputeError> {
        if new_max_iter < self.max_iter {
            return Err(ComputeError::StateMismatch {
                reason: format!(
                    "cannot resume to {new_max_iter} iterations, state already reached {}",
                    self.max_iter
                ),
            });
        }
        if self.pixels.len() != self.real.len() * self.imag.len() {
            return Err(ComputeError::StateMismatch {
                reason: format!(
                    "{} pixel states for a {}×{} grid",
                    self.pixels.len(),
                    self.real.len(),
                    self.imag.len()
                ),
            });
        }
        Ok(())
    }

    /// Replace the pixel states after a completed step at `max_iter`.
    pub fn with_pixels(mut self, pixels: Vec<PixelState>, max_iter: u32) -> Self {
        debug_assert_eq!(pixels.len(), self.real.len() * self.imag.len());
        self.pixels = pixels;
        self.max_iter = max_iter;
        self
    }

    /// Move the pixel states out, leaving the state empty until
    /// [`with_pixels`](Self::with_pixels) puts them back.
    pub fn take_pixels(&mut self) -> Vec<PixelState> {
        std::mem::take(&mut self.pixels)
    }

    /// Budget the stored pixels have been iterated to.
    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    pub fn escape_radius_sq(&self) -> f64 {
        self.escape_radius_sq
    }

    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn imag(&self) -> &[f64] {
        &self.imag
    }

    pub fn width(&self) -> usize {
        self.real.len()
    }

    pub fn height(&self) -> usize {
        self.imag.len()
    }

    pub fn pixels(&self) -> &[PixelState] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Iteration counts as reported by the last completed step.
    pub fn counts(&self) -> Vec<u32> {
        self.pixels.iter().map(PixelState::count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_state_is_row_major() {
        let state = ContinuationState::cold(&[-3.0, 0.0, 0.1], &[0.0, 3.0], 100, 4.0).unwrap();
        assert_eq!(state.width(), 3);
        assert_eq!(state.height(), 2);
        assert_eq!(state.pixel_count(), 6);
        // Row 0, column 1 is the origin: interior.
        assert_eq!(state.pixels()[1], PixelState::Interior);
        // Row 1 has im = 3: still pending before any step.
        assert!(matches!(state.pixels()[4], PixelState::Pending { iterations: 0, .. }));
        assert_eq!(state.max_iter(), 0);
    }

    #[test]
    fn cold_rejects_bad_input() {
        assert!(ContinuationState::cold(&[], &[0.0], 100, 4.0).is_err());
        assert!(ContinuationState::cold(&[0.0], &[f64::NAN], 100, 4.0).is_err());
        assert!(ContinuationState::cold(&[0.0], &[0.0], 100, 1.0).is_err());
        assert!(ContinuationState::cold(&[0.0], &[0.0], 0, 4.0).is_err());
    }

    #[test]
    fn resume_below_reached_budget_is_rejected() {
        let state = ContinuationState::cold(&[0.5], &[0.5], 400, 4.0).unwrap();
        let pixels = state.pixels().to_vec();
        let state = state.with_pixels(pixels, 400);
        assert!(state.check_resume(400).is_ok());
        assert!(state.check_resume(1600).is_ok());
        assert!(matches!(
            state.check_resume(100),
            Err(ComputeError::StateMismatch { .. })
        ));
    }
}
