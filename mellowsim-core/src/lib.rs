pub mod backend;
pub mod complex;
pub mod continuation;
pub mod error;
pub mod escape;
pub mod region;
pub mod scaling;

// Re-export primary types for convenience.
pub use backend::{BackendKind, ComputeBackend, StepOutput};
pub use complex::Complex;
pub use continuation::ContinuationState;
pub use error::{ComputeError, CoreError};
pub use escape::{advance_block, validate_escape_radius, PixelState, MIN_ESCAPE_RADIUS};
pub use region::{Bounds, Region, RegionParams, Selection};
pub use scaling::{accumulate_magnification, iteration_budget};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
