use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use mellowsim_core::{
    advance_block, BackendKind, ComputeBackend, ComputeError, ContinuationState, PixelState,
    StepOutput,
};

const BACKEND: &str = "accelerator";

// ---------------------------------------------------------------------------
// Device seam
// ---------------------------------------------------------------------------

/// One batch of work handed to a device: the whole pixel grid at one budget.
pub struct KernelJob<'a> {
    pub real: &'a [f64],
    pub imag: &'a [f64],
    pub max_iter: u32,
    pub escape_radius_sq: f64,
    /// Row-major pixel states, advanced in place.
    pub pixels: &'a mut [PixelState],
    /// Row-major counts, written by the device.
    pub counts: &'a mut [u32],
}

/// A device able to run the escape kernel over a whole grid in one call.
///
/// How the device parallelises internally is its own business; the backend
/// only sees one blocking `dispatch` per refinement step.
pub trait Device: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare the kernel (compile, allocate queues). Called once.
    fn build(&mut self) -> Result<(), ComputeError>;

    /// Run one job to completion.
    fn dispatch(&self, job: KernelJob<'_>) -> Result<(), ComputeError>;
}

// ---------------------------------------------------------------------------
// Host device
// ---------------------------------------------------------------------------

/// Runs the kernel on a dedicated Rayon thread pool, one task per row.
pub struct HostDevice {
    threads: usize,
    pool: Option<rayon::ThreadPool>,
}

impl HostDevice {
    /// `threads == 0` lets Rayon pick one thread per processing unit.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            pool: None,
        }
    }

    /// Host devices on this machine. There is always exactly one.
    pub fn discover(threads: usize) -> Vec<Self> {
        vec![Self::new(threads)]
    }
}

impl Device for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn build(&mut self) -> Result<(), ComputeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("mellowsim-accel-{i}"))
            .build()
            .map_err(|e| ComputeError::BackendBuildFailure {
                backend: BACKEND,
                reason: e.to_string(),
            })?;
        self.pool = Some(pool);
        Ok(())
    }

    fn dispatch(&self, job: KernelJob<'_>) -> Result<(), ComputeError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| ComputeError::KernelExecutionFailure {
                backend: BACKEND,
                reason: "device dispatched before build".into(),
            })?;
        let KernelJob {
            real,
            imag,
            max_iter,
            escape_radius_sq,
            pixels,
            counts,
        } = job;
        let width = real.len();
        pool.install(|| {
            pixels
                .par_chunks_mut(width)
                .zip(counts.par_chunks_mut(width))
                .enumerate()
                .for_each(|(row, (px, cnt))| {
                    advance_block(real, imag, row * width, px, cnt, max_iter, escape_radius_sq);
                });
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Compute strategy issuing one synchronous device dispatch per step.
pub struct AcceleratorBackend<D> {
    device: D,
}

impl<D: Device> AcceleratorBackend<D> {
    /// Build the device kernel. Failure is fatal; there is no fallback.
    pub fn new(mut device: D) -> Result<Self, ComputeError> {
        device.build()?;
        info!(device = device.name(), "Accelerator ready");
        Ok(Self { device })
    }

    /// Take the first device from `candidates`.
    pub fn from_candidates(candidates: impl IntoIterator<Item = D>) -> Result<Self, ComputeError> {
        let device = candidates
            .into_iter()
            .next()
            .ok_or(ComputeError::NoComputeDeviceAvailable)?;
        Self::new(device)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn step(&self, mut state: ContinuationState, max_iter: u32) -> Result<StepOutput, ComputeError> {
        let start = Instant::now();
        let mut pixels = state.take_pixels();
        let mut counts = vec![0u32; pixels.len()];
        self.device.dispatch(KernelJob {
            real: state.real(),
            imag: state.imag(),
            max_iter,
            escape_radius_sq: state.escape_radius_sq(),
            pixels: &mut pixels,
            counts: &mut counts,
        })?;
        debug!(
            device = self.device.name(),
            elapsed_ms = start.elapsed().as_millis(),
            max_iter,
            "Kernel dispatch complete"
        );
        Ok(StepOutput {
            counts,
            state: state.with_pixels(pixels, max_iter),
        })
    }
}

impl<D: Device> ComputeBackend for AcceleratorBackend<D> {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerator
    }

    fn compute_full(
        &self,
        real: &[f64],
        imag: &[f64],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> Result<StepOutput, ComputeError> {
        let state = ContinuationState::cold(real, imag, max_iter, escape_radius_sq)?;
        self.step(state, max_iter)
    }

    fn compute_continue(
        &self,
        state: &ContinuationState,
        new_max_iter: u32,
    ) -> Result<StepOutput, ComputeError> {
        state.check_resume(new_max_iter)?;
        self.step(state.clone(), new_max_iter)
    }
}
