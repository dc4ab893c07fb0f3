use std::path::PathBuf;

use thiserror::Error;

/// Problems with a guided-tour file. All are recoverable: navigation state is
/// left untouched.
#[derive(Debug, Error)]
pub enum TourError {
    #[error("tour file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("malformed tour at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("tour recorded at width {recorded} cannot be replayed at width {live}")]
    IncompatibleWidth { recorded: u32, live: u32 },

    #[error("tour point ({x}, {y}) lies outside the raster")]
    OutOfBounds { x: u32, y: u32 },
}

/// Errors surfaced by the navigation controller.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Tour(#[from] TourError),

    #[error(transparent)]
    Render(#[from] mellowsim_render::RenderError),

    #[error(transparent)]
    Compute(#[from] mellowsim_core::ComputeError),

    #[error(transparent)]
    Core(#[from] mellowsim_core::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
