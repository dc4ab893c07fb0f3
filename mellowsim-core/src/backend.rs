use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationState;
use crate::error::ComputeError;

/// Which compute strategy a region is refined with.
///
/// Chosen once per region at construction; a region is never refined by
/// two strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Waves of worker threads over fixed-size pixel blocks.
    #[default]
    WorkerPool,
    /// One blocking batch dispatch per step on an accelerator device.
    Accelerator,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::WorkerPool => "worker-pool",
            Self::Accelerator => "accelerator",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of one compute step: per-pixel counts plus the state to resume from.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Row-major escape counts, `0` for pixels that have not escaped.
    pub counts: Vec<u32>,
    pub state: ContinuationState,
}

/// Contract shared by every compute strategy.
///
/// Both operations block until the whole grid is done. `compute_continue`
/// must classify every pixel exactly as a `compute_full` to the same budget
/// would; continuation only saves work.
pub trait ComputeBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Cold computation over the Cartesian product of `real` (columns) and
    /// `imag` (rows), starting every orbit at `z = 0`.
    fn compute_full(
        &self,
        real: &[f64],
        imag: &[f64],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> Result<StepOutput, ComputeError>;

    /// Warm computation resuming every pixel from `state` up to `new_max_iter`.
    ///
    /// `state` is left untouched so a failed step leaves the caller with the
    /// previous, still-valid state.
    fn compute_continue(
        &self,
        state: &ContinuationState,
        new_max_iter: u32,
    ) -> Result<StepOutput, ComputeError>;
}

impl<B: ComputeBackend + ?Sized> ComputeBackend for &B {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn compute_full(
        &self,
        real: &[f64],
        imag: &[f64],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> Result<StepOutput, ComputeError> {
        (**self).compute_full(real, imag, max_iter, escape_radius_sq)
    }

    fn compute_continue(
        &self,
        state: &ContinuationState,
        new_max_iter: u32,
    ) -> Result<StepOutput, ComputeError> {
        (**self).compute_continue(state, new_max_iter)
    }
}
