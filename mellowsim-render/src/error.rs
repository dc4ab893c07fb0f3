use std::path::PathBuf;

use mellowsim_core::BackendKind;
use thiserror::Error;

/// Errors originating from the refinement and export pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid budget schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("region uses the {region} backend but the renderer drives {renderer}")]
    BackendMismatch {
        region: BackendKind,
        renderer: BackendKind,
    },

    #[error("region has no completed budget to export")]
    NotRendered,

    #[error("failed to export {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error(transparent)]
    Compute(#[from] mellowsim_core::ComputeError),

    #[error(transparent)]
    Core(#[from] mellowsim_core::CoreError),
}
