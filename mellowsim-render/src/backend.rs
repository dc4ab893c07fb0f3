//! Runtime selection between the two compute strategies.

use mellowsim_core::{BackendKind, ComputeBackend, ComputeError, ContinuationState, StepOutput};
use tracing::info;

use crate::accelerator::{AcceleratorBackend, HostDevice};
use crate::worker_pool::WorkerPoolBackend;

/// The strategy chosen at startup. There is no fallback between variants.
pub enum Backend {
    WorkerPool(WorkerPoolBackend),
    Accelerator(AcceleratorBackend<HostDevice>),
}

impl Backend {
    /// Build the strategy named by `kind`.
    ///
    /// `workers == 0` means one worker (or device thread) per processing
    /// unit. `block_size` only applies to the worker pool.
    pub fn build(kind: BackendKind, workers: usize, block_size: usize) -> Result<Self, ComputeError> {
        let backend = match kind {
            BackendKind::WorkerPool => Self::WorkerPool(WorkerPoolBackend::new(workers, block_size)?),
            BackendKind::Accelerator => {
                Self::Accelerator(AcceleratorBackend::from_candidates(HostDevice::discover(workers))?)
            }
        };
        info!(backend = %kind, workers, "Compute backend built");
        Ok(backend)
    }

    fn inner(&self) -> &dyn ComputeBackend {
        match self {
            Self::WorkerPool(b) => b,
            Self::Accelerator(b) => b,
        }
    }
}

impl ComputeBackend for Backend {
    fn kind(&self) -> BackendKind {
        self.inner().kind()
    }

    fn compute_full(
        &self,
        real: &[f64],
        imag: &[f64],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> Result<StepOutput, ComputeError> {
        self.inner().compute_full(real, imag, max_iter, escape_radius_sq)
    }

    fn compute_continue(
        &self,
        state: &ContinuationState,
        new_max_iter: u32,
    ) -> Result<StepOutput, ComputeError> {
        self.inner().compute_continue(state, new_max_iter)
    }
}
