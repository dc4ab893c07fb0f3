use std::num::NonZeroUsize;
use std::thread;
use std::time::Instant;

use tracing::debug;

use mellowsim_core::{
    advance_block, BackendKind, ComputeBackend, ComputeError, ContinuationState, PixelState,
    StepOutput,
};

/// Default block size in pixels.
pub const DEFAULT_BLOCK_SIZE: usize = 16_384;

const BACKEND: &str = "worker-pool";

/// Compute strategy that runs waves of scoped worker threads.
///
/// The pixel range is cut into contiguous blocks of `block_size`. Each wave
/// starts one worker per processing unit (fewer if fewer blocks remain) and
/// joins them all before the next wave. Every worker owns its block of the
/// output outright, so no lock is taken.
#[derive(Debug, Clone)]
pub struct WorkerPoolBackend {
    workers: usize,
    block_size: usize,
}

impl WorkerPoolBackend {
    /// `workers == 0` uses every available processing unit.
    pub fn new(workers: usize, block_size: usize) -> Result<Self, ComputeError> {
        if block_size == 0 {
            return Err(ComputeError::BackendBuildFailure {
                backend: BACKEND,
                reason: "block size must be > 0".into(),
            });
        }
        let workers = if workers == 0 {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .map_err(|e| ComputeError::BackendBuildFailure {
                    backend: BACKEND,
                    reason: format!("cannot query processing units: {e}"),
                })?
        } else {
            workers
        };
        debug!(workers, block_size, "Worker pool configured");
        Ok(Self {
            workers,
            block_size,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn step(&self, mut state: ContinuationState, max_iter: u32) -> Result<StepOutput, ComputeError> {
        let start = Instant::now();
        let mut pixels = state.take_pixels();
        let mut counts = vec![0u32; pixels.len()];
        self.run_waves(
            state.real(),
            state.imag(),
            &mut pixels,
            &mut counts,
            max_iter,
            state.escape_radius_sq(),
        )?;

        debug!(
            elapsed_ms = start.elapsed().as_millis(),
            max_iter,
            pixels = pixels.len(),
            "Worker pool step complete"
        );
        Ok(StepOutput {
            counts,
            state: state.with_pixels(pixels, max_iter),
        })
    }

    fn run_waves(
        &self,
        real: &[f64],
        imag: &[f64],
        pixels: &mut [PixelState],
        counts: &mut [u32],
        max_iter: u32,
        escape_radius_sq: f64,
    ) -> Result<(), ComputeError> {
        let block_size = self.block_size;
        let mut blocks = pixels
            .chunks_mut(block_size)
            .zip(counts.chunks_mut(block_size))
            .enumerate();

        let mut wave_index = 0usize;
        loop {
            let wave: Vec<_> = blocks.by_ref().take(self.workers).collect();
            if wave.is_empty() {
                break;
            }
            debug!(wave = wave_index, workers = wave.len(), "Dispatching wave");

            thread::scope(|scope| -> Result<(), ComputeError> {
                let mut handles = Vec::with_capacity(wave.len());
                for (block, (px, cnt)) in wave {
                    let handle = thread::Builder::new()
                        .name(format!("mellowsim-worker-{block}"))
                        .spawn_scoped(scope, move || {
                            advance_block(
                                real,
                                imag,
                                block * block_size,
                                px,
                                cnt,
                                max_iter,
                                escape_radius_sq,
                            )
                        })
                        .map_err(|e| kernel_failure(format!("failed to spawn worker: {e}")))?;
                    handles.push((block, handle));
                }
                for (block, handle) in handles {
                    handle
                        .join()
                        .map_err(|_| kernel_failure(format!("worker for block {block} panicked")))?;
                }
                Ok(())
            })?;
            wave_index += 1;
        }
        Ok(())
    }
}

fn kernel_failure(reason: String) -> ComputeError {
    ComputeError::KernelExecutionFailure {
        backend: BACKEND,
        reason,
    }
}

impl ComputeBackend for WorkerPoolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WorkerPool
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
