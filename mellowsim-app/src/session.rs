//! Runtime-mutable navigation state: the current zoom factor, the overlay
//! and the last selection.

use tracing::debug;

use mellowsim_core::Selection;

use crate::config::ZoomSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSession {
    zoom_factor: f64,
    min_zoom: f64,
    max_zoom: f64,
    change_step: f64,
    overlay_visible: bool,
    last_selection: Option<Selection>,
}

impl NavigationSession {
    pub fn new(zoom: &ZoomSettings) -> Self {
        let (min_zoom, max_zoom) = if zoom.min <= zoom.max {
            (zoom.min, zoom.max)
        } else {
            (zoom.max, zoom.min)
        };
        Self {
            zoom_factor: zoom.factor.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            change_step: zoom.change_step,
            overlay_visible: true,
            last_selection: None,
        }
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Set the zoom factor, clamped to `[min, max]`.
    pub fn set_zoom_factor(&mut self, factor: f64) -> f64 {
        if factor.is_finite() {
            self.zoom_factor = factor.clamp(self.min_zoom, self.max_zoom);
        }
        self.zoom_factor
    }

    /// Grow (`delta > 0`) or shrink (`delta < 0`) the zoom factor by one
    /// change step, then re-clamp.
    pub fn adjust_zoom_factor(&mut self, delta: f64) -> f64 {
        let scale = if delta > 0.0 {
            1.0 + self.change_step
        } else if delta < 0.0 {
            1.0 - self.change_step
        } else {
            return self.zoom_factor;
        };
        let factor = self.set_zoom_factor(self.zoom_factor * scale);
        debug!(zoom_factor = factor, "Zoom factor adjusted");
        factor
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn toggle_overlay(&mut self) -> bool {
        self.overlay_visible = !self.overlay_visible;
        self.overlay_visible
    }

    pub fn last_selection(&self) -> Option<Selection> {
        self.last_selection
    }

    pub fn record_selection(&mut self, selection: Selection) {
        self.last_selection = Some(selection);
    }

    /// Selection of `zoom_factor` × the raster size centred on the cursor,
    /// clamped inside the raster.
    pub fn selection_at(&self, cx: u32, cy: u32, raster_w: u32, raster_h: u32) -> Selection {
        let w = ((raster_w as f64 * self.zoom_factor).round() as u32).clamp(1, raster_w.max(1));
        let h = ((raster_h as f64 * self.zoom_factor).round() as u32).clamp(1, raster_h.max(1));
        Selection::centered(cx, cy, w, h, raster_w, raster_h)
    }
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new(&ZoomSettings::default())
    }
}
