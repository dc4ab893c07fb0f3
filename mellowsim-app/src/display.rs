//! The display collaborator: whatever shows frames and the selection overlay.

use tracing::debug;

use mellowsim_core::Selection;
use mellowsim_render::{Channel, Hsv, RenderBuffer};

pub trait DisplaySink<T> {
    /// Show a color buffer, with the selection rectangle when the overlay is on.
    fn show(&mut self, pixels: &[Hsv<T>], width: u32, height: u32, overlay: Option<Selection>);

    fn set_overlay_visible(&mut self, visible: bool);
}

/// Discards everything. Used headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl<T> DisplaySink<T> for NullDisplay {
    fn show(&mut self, _pixels: &[Hsv<T>], _width: u32, _height: u32, _overlay: Option<Selection>) {}

    fn set_overlay_visible(&mut self, _visible: bool) {}
}

/// Converts each frame to RGBA, as a window does before upload, and logs it.
#[derive(Debug, Clone)]
pub struct LogDisplay {
    hue_range: f64,
    frames: u64,
    last: Option<RenderBuffer>,
}

impl LogDisplay {
    pub fn new(hue_range: f64) -> Self {
        Self {
            hue_range,
            frames: 0,
            last: None,
        }
    }

    /// Frames shown so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The most recently shown frame.
    pub fn last_frame(&self) -> Option<&RenderBuffer> {
        self.last.as_ref()
    }
}

impl<T: Channel> DisplaySink<T> for LogDisplay {
    fn show(&mut self, pixels: &[Hsv<T>], width: u32, height: u32, overlay: Option<Selection>) {
        self.frames += 1;
        let rgba = RenderBuffer::from_hsv(width, height, pixels, self.hue_range);
        debug!(
            frame = self.frames,
            width,
            height,
            bytes = rgba.pixels.len(),
            overlay = ?overlay,
            "Frame shown"
        );
        self.last = Some(rgba);
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        debug!(visible, "Overlay visibility changed");
    }
}
