use thiserror::Error;

/// Errors raised while validating regions and iteration parameters.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid escape radius: {0} (must be finite and >= 2.0)")]
    InvalidEscapeRadius(f64),

    #[error("invalid sample arrays: {reason}")]
    InvalidSamples { reason: String },
}

/// Errors raised by a compute backend.
///
/// Build and device errors are fatal at startup. A kernel failure is fatal
/// for the refinement step that hit it; the caller keeps the previous step.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("no compute device available")]
    NoComputeDeviceAvailable,

    #[error("failed to build {backend} backend: {reason}")]
    BackendBuildFailure {
        backend: &'static str,
        reason: String,
    },

    #[error("{backend} kernel failed: {reason}")]
    KernelExecutionFailure {
        backend: &'static str,
        reason: String,
    },

    #[error("continuation state mismatch: {reason}")]
    StateMismatch { reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}
