use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::BackendKind;
use crate::continuation::ContinuationState;
use crate::error::CoreError;
use crate::scaling::{accumulate_magnification, iteration_budget};

// ---------------------------------------------------------------------------
// Bounds & selection
// ---------------------------------------------------------------------------

/// Real/imaginary extents of a region. Sign-agnostic: a start may exceed its
/// end, only the distance matters for step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
}

impl Bounds {
    pub fn new(x_start: f64, x_end: f64, y_start: f64, y_end: f64) -> Self {
        Self {
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    pub fn x_extent(&self) -> f64 {
        (self.x_end - self.x_start).abs()
    }

    pub fn y_extent(&self) -> f64 {
        (self.y_end - self.y_start).abs()
    }

    fn is_finite(&self) -> bool {
        [self.x_start, self.x_end, self.y_start, self.y_end]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A rectangle in a region's raster coordinates. `(x, y)` is the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A `width × height` rectangle centred on `(cx, cy)`, clamped into the raster.
    pub fn centered(cx: u32, cy: u32, width: u32, height: u32, raster_w: u32, raster_h: u32) -> Self {
        Self::new(cx.saturating_sub(width / 2), cy.saturating_sub(height / 2), width, height)
            .clamped(raster_w, raster_h)
    }

    /// Shrink and shift the rectangle so it lies fully inside the raster.
    pub fn clamped(self, raster_w: u32, raster_h: u32) -> Self {
        let width = self.width.clamp(1, raster_w.max(1));
        let height = self.height.clamp(1, raster_h.max(1));
        Self {
            x: self.x.min(raster_w.saturating_sub(width)),
            y: self.y.min(raster_h.saturating_sub(height)),
            width,
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Construction parameters for a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionParams {
    pub bounds: Bounds,
    /// Raster width in pixels; height is derived from the aspect ratio.
    pub width: u32,
    pub aspect_ratio: f64,
    pub magnification: u64,
    pub base_iter: u32,
    pub backend: BackendKind,
}

/// A rectangular sub-area of the complex plane, its raster, and its buffer.
///
/// Geometry is fixed at construction. Only the progressive renderer fills the
/// buffer (through [`commit_step`](Self::commit_step)); navigation only flips
/// the active flag.
#[derive(Debug, Clone)]
pub struct Region<P> {
    bounds: Bounds,
    width: u32,
    height: u32,
    aspect_ratio: f64,
    x_step: f64,
    y_step: f64,
    magnification: u64,
    base_iter: u32,
    iteration_budget: u32,
    backend: BackendKind,
    active: bool,
    buffer: Vec<P>,
    counts: Vec<u32>,
    completed_budget: Option<u32>,
    continuation: Option<ContinuationState>,
}

impl<P: Clone + Default> Region<P> {
    /// Validate the parameters and build an unrendered region.
    ///
    /// No computation happens here; the buffer starts out default-filled.
    pub fn new(params: RegionParams) -> crate::Result<Self> {
        let RegionParams {
            bounds,
            width,
            aspect_ratio,
            magnification,
            base_iter,
            backend,
        } = params;

        if width == 0 {
            return Err(invalid("width must be > 0".into()));
        }
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(invalid(format!("aspect ratio must be positive, got {aspect_ratio}")));
        }
        let height = (width as f64 / aspect_ratio) as u32;
        if height == 0 {
            return Err(invalid(format!(
                "width {width} at aspect {aspect_ratio} leaves no rows"
            )));
        }
        if !bounds.is_finite() {
            return Err(invalid("bounds must be finite".into()));
        }
        let x_step = bounds.x_extent() / width as f64;
        let y_step = bounds.y_extent() / height as f64;
        if !(x_step > 0.0 && y_step > 0.0) {
            return Err(invalid(format!(
                "degenerate bounds ({} × {})",
                bounds.x_extent(),
                bounds.y_extent()
            )));
        }
        if magnification == 0 {
            return Err(invalid("magnification must be >= 1".into()));
        }
        if base_iter == 0 {
            return Err(CoreError::InvalidMaxIterations(base_iter));
        }

        let pixel_count = width as usize * height as usize;
        let budget = iteration_budget(base_iter, magnification);
        debug!(width, height, magnification, budget, backend = %backend, "Region constructed");
        Ok(Self {
            bounds,
            width,
            height,
            aspect_ratio,
            x_step,
            y_step,
            magnification,
            base_iter,
            iteration_budget: budget,
            backend,
            active: false,
            buffer: vec![P::default(); pixel_count],
            counts: vec![0; pixel_count],
            completed_budget: None,
            continuation: None,
        })
    }

    /// Parameters for the region selected inside this one.
    ///
    /// The selection is clamped into this raster first. The child keeps the
    /// raster width, aspect, base budget and backend of its parent.
    pub fn child_params(&self, selection: Selection, zoom_factor: f64) -> RegionParams {
        let sel = selection.clamped(self.width, self.height);
        let x_start = self.bounds.x_start + sel.x as f64 * self.x_step;
        let y_start = self.bounds.y_start - sel.y as f64 * self.y_step;
        RegionParams {
            bounds: Bounds {
                x_start,
                x_end: x_start + sel.width as f64 * self.x_step,
                y_start,
                y_end: y_start + sel.height as f64 * self.y_step,
            },
            width: self.width,
            aspect_ratio: self.aspect_ratio,
            magnification: accumulate_magnification(self.magnification, zoom_factor),
            base_iter: self.base_iter,
            backend: self.backend,
        }
    }

    /// Record a completed refinement step.
    ///
    /// Replaces buffer, counts and continuation together so the region always
    /// reflects exactly one finished budget.
    pub fn commit_step(
        &mut self,
        budget: u32,
        counts: Vec<u32>,
        buffer: Vec<P>,
        continuation: ContinuationState,
    ) -> crate::Result<()> {
        let expected = self.pixel_count();
        if counts.len() != expected || buffer.len() != expected {
            return Err(CoreError::InvalidSamples {
                reason: format!(
                    "step produced {} counts and {} colors for {expected} pixels",
                    counts.len(),
                    buffer.len()
                ),
            });
        }
        self.counts = counts;
        self.buffer = buffer;
        self.continuation = Some(continuation);
        self.completed_budget = Some(budget);
        Ok(())
    }

    /// Drop the buffer and all computed state, keeping the geometry.
    ///
    /// An evicted region must be refined again before it can be shown.
    pub fn evict(&mut self) {
        self.buffer = Vec::new();
        self.counts = Vec::new();
        self.continuation = None;
        self.completed_budget = None;
    }

    /// Reset an evicted region's buffers so it can be refined again.
    pub fn reset_buffers(&mut self) {
        let pixel_count = self.pixel_count();
        self.buffer = vec![P::default(); pixel_count];
        self.counts = vec![0; pixel_count];
        self.continuation = None;
        self.completed_budget = None;
    }
}

impl<P> Region<P> {
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn x_step(&self) -> f64 {
        self.x_step
    }

    pub fn y_step(&self) -> f64 {
        self.y_step
    }

    pub fn magnification(&self) -> u64 {
        self.magnification
    }

    pub fn base_iter(&self) -> u32 {
        self.base_iter
    }

    pub fn iteration_budget(&self) -> u32 {
        self.iteration_budget
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Row-major color buffer. Empty once evicted.
    pub fn buffer(&self) -> &[P] {
        &self.buffer
    }

    /// Row-major escape counts of the last completed step.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Budget of the last completed step, if any.
    pub fn completed_budget(&self) -> Option<u32> {
        self.completed_budget
    }

    /// Whether the last completed step reached the full iteration budget.
    pub fn is_fully_refined(&self) -> bool {
        self.completed_budget == Some(self.iteration_budget)
    }

    pub fn is_rendered(&self) -> bool {
        self.completed_budget.is_some()
    }

    pub fn continuation(&self) -> Option<&ContinuationState> {
        self.continuation.as_ref()
    }

    /// Drop the transient continuation state, keeping the finished buffer.
    pub fn discard_continuation(&mut self) {
        self.continuation = None;
    }

    /// Real sample per column: `x_start + x · x_step`.
    pub fn real_samples(&self) -> Vec<f64> {
        (0..self.width)
            .map(|x| self.bounds.x_start + x as f64 * self.x_step)
            .collect()
    }

    /// Imaginary sample per row: `y_start − y · y_step`, so row 0 is the top.
    pub fn imag_samples(&self) -> Vec<f64> {
        (0..self.height)
            .map(|y| self.bounds.y_start - y as f64 * self.y_step)
            .collect()
    }
}

fn invalid(reason: String) -> CoreError {
    CoreError::InvalidRegion { reason }
}
