//! Coarse-to-fine refinement of one region.
//!
//! A refinement runs a cold step at the smallest budget of a schedule, then
//! warm steps resuming from the continuation state, coloring and publishing a
//! frame after each. Cancellation is cooperative and checked at the start of
//! every step, so the region always holds the last fully completed step.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mellowsim_core::{ComputeBackend, Region, StepOutput};

use crate::channel::Channel;
use crate::color::{colorize, ColorParams, Hsv};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current refinement generation for cancellation and progress.
///
/// Incrementing the generation tells an in-flight refinement to stop before
/// its next step. The progress counters count finished steps.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    steps_done: AtomicUsize,
    steps_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            steps_done: AtomicUsize::new(0),
            steps_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current refinement by advancing the generation. Returns
    /// the new generation.
    pub fn cancel(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn reset_progress(&self, total: usize) {
        self.steps_total.store(total, Ordering::Relaxed);
        self.steps_done.store(0, Ordering::Relaxed);
    }

    fn inc_progress(&self) {
        self.steps_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Finished steps of the current refinement as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.steps_done.load(Ordering::Relaxed),
            self.steps_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// States of one refinement: `Idle → ColdStep → WarmStep* → Done`, with
/// `Cancelled` reachable from any non-idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    ColdStep,
    WarmStep,
    Done,
    Cancelled,
}

impl RenderPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ColdStep => "cold",
            Self::WarmStep => "warm",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// How schedules are derived from a region's budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Budget of the cold step.
    #[serde(default = "default_base_step")]
    pub base_step: u32,
    /// Factor between consecutive budgets.
    #[serde(default = "default_multiple")]
    pub multiple: u32,
}

fn default_base_step() -> u32 {
    100
}
fn default_multiple() -> u32 {
    4
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            base_step: default_base_step(),
            multiple: default_multiple(),
        }
    }
}

impl ScheduleParams {
    pub fn schedule_for(&self, target: u32) -> crate::Result<BudgetSchedule> {
        BudgetSchedule::geometric(target, self.base_step, self.multiple)
    }
}

/// Strictly increasing, non-empty list of budgets ending at the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSchedule {
    budgets: Vec<u32>,
}

impl BudgetSchedule {
    /// `base, base·multiple, base·multiple², …` below `target`, then `target`.
    ///
    /// A base at or above the target yields the single-step schedule
    /// `[target]`.
    pub fn geometric(target: u32, base: u32, multiple: u32) -> crate::Result<Self> {
        if target == 0 {
            return Err(invalid_schedule("target budget must be > 0".into()));
        }
        if base == 0 {
            return Err(invalid_schedule("base step must be > 0".into()));
        }
        if multiple < 2 {
            return Err(invalid_schedule(format!("multiple must be >= 2, got {multiple}")));
        }
        let mut budgets = Vec::new();
        let mut b = base;
        while b < target {
            budgets.push(b);
            b = b.saturating_mul(multiple);
        }
        budgets.push(target);
        Ok(Self { budgets })
    }

    /// Use an explicit list of budgets.
    pub fn from_budgets(budgets: Vec<u32>) -> crate::Result<Self> {
        match budgets.first() {
            None => return Err(invalid_schedule("schedule is empty".into())),
            Some(0) => return Err(invalid_schedule("budgets must be > 0".into())),
            Some(_) => {}
        }
        if let Some(w) = budgets.windows(2).find(|w| w[0] >= w[1]) {
            return Err(invalid_schedule(format!(
                "budgets must strictly increase ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { budgets })
    }

    pub fn budgets(&self) -> &[u32] {
        &self.budgets
    }

    /// The last, final budget.
    pub fn target(&self) -> u32 {
        // Never empty after construction.
        self.budgets[self.budgets.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }
}

fn invalid_schedule(reason: String) -> RenderError {
    RenderError::InvalidSchedule { reason }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One published intermediate (or final) frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a, T> {
    pub phase: RenderPhase,
    /// 1-based index of the step in the schedule.
    pub step: usize,
    pub steps: usize,
    pub budget: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [Hsv<T>],
    pub elapsed: Duration,
}

/// Receiver of published frames (the display collaborator, a test, ...).
pub trait FrameSink<T> {
    fn publish(&mut self, frame: Frame<'_, T>);
}

impl<T, F> FrameSink<T> for F
where
    F: FnMut(Frame<'_, T>),
{
    fn publish(&mut self, frame: Frame<'_, T>) {
        self(frame)
    }
}

/// How a refinement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineOutcome {
    /// [`RenderPhase::Done`] or [`RenderPhase::Cancelled`].
    pub phase: RenderPhase,
    /// Budget the region reflects after the refinement.
    pub completed_budget: Option<u32>,
    pub steps_run: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Drives a compute backend through a budget schedule for one region at a
/// time.
pub struct ProgressiveRenderer<B> {
    backend: B,
    color: ColorParams,
    escape_radius_sq: f64,
    cancel: Arc<RenderCancel>,
}

impl<B: ComputeBackend> ProgressiveRenderer<B> {
    pub fn new(backend: B, color: ColorParams, escape_radius: f64) -> crate::Result<Self> {
        mellowsim_core::validate_escape_radius(escape_radius)?;
        Ok(Self {
            backend,
            color,
            escape_radius_sq: escape_radius * escape_radius,
            cancel: Arc::new(RenderCancel::new()),
        })
    }

    /// Shared cancellation handle.
    pub fn cancel_handle(&self) -> Arc<RenderCancel> {
        Arc::clone(&self.cancel)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn color_params(&self) -> &ColorParams {
        &self.color
    }

    /// Refine `region` through `schedule`, publishing a frame per step.
    ///
    /// Budgets the region already completed are skipped; a retained
    /// continuation is resumed warm. A cancelled refinement returns
    /// `Ok` with [`RenderPhase::Cancelled`]; a compute failure returns the
    /// error and leaves the region at its last completed step.
    pub fn refine<T, S>(
        &self,
        region: &mut Region<Hsv<T>>,
        schedule: &BudgetSchedule,
        sink: &mut S,
    ) -> crate::Result<RefineOutcome>
    where
        T: Channel,
        S: FrameSink<T> + ?Sized,
    {
        self.refine_under(region, schedule, sink, self.cancel.generation())
    }

    /// Like [`refine`](Self::refine), but only while the cancellation
    /// generation equals `generation`.
    ///
    /// A request queued behind newer ones passes the generation it was
    /// issued under, so it is cancelled before its first step once
    /// superseded.
    pub fn refine_under<T, S>(
        &self,
        region: &mut Region<Hsv<T>>,
        schedule: &BudgetSchedule,
        sink: &mut S,
        gen: u64,
    ) -> crate::Result<RefineOutcome>
    where
        T: Channel,
        S: FrameSink<T> + ?Sized,
    {
        if region.backend() != self.backend.kind() {
            return Err(RenderError::BackendMismatch {
                region: region.backend(),
                renderer: self.backend.kind(),
            });
        }
        if schedule.target() != region.iteration_budget() {
            return Err(invalid_schedule(format!(
                "schedule ends at {} but the region budget is {}",
                schedule.target(),
                region.iteration_budget()
            )));
        }
        if !region.is_rendered() && region.buffer().len() != region.pixel_count() {
            region.reset_buffers();
        }

        let start = Instant::now();
        let done_budget = region.completed_budget().unwrap_or(0);
        let pending: Vec<u32> = schedule
            .budgets()
            .iter()
            .copied()
            .filter(|&b| b > done_budget)
            .collect();
        let steps = pending.len();
        self.cancel.reset_progress(steps);

        let real = region.real_samples();
        let imag = region.imag_samples();
        let mut steps_run = 0;

        for (i, &budget) in pending.iter().enumerate() {
            if self.cancel.generation() != gen {
                info!(
                    completed_budget = ?region.completed_budget(),
                    steps_run,
                    "Refinement cancelled"
                );
                return Ok(RefineOutcome {
                    phase: RenderPhase::Cancelled,
                    completed_budget: region.completed_budget(),
                    steps_run,
                    elapsed: start.elapsed(),
                });
            }

            let step_start = Instant::now();
            let (phase, result) = match region.continuation() {
                Some(state) => (
                    RenderPhase::WarmStep,
                    self.backend.compute_continue(state, budget),
                ),
                None => (
                    RenderPhase::ColdStep,
                    self.backend.compute_full(&real, &imag, budget, self.escape_radius_sq),
                ),
            };
            let StepOutput { counts, state } = result.map_err(|e| {
                error!(budget, phase = phase.label(), error = %e, "Compute step failed");
                e
            })?;

            let pixels = colorize::<T>(&counts, budget, &self.color);
            region.commit_step(budget, counts, pixels, state)?;
            steps_run += 1;
            self.cancel.inc_progress();

            let elapsed = step_start.elapsed();
            info!(
                phase = phase.label(),
                budget,
                elapsed_ms = elapsed.as_millis(),
                x_start = region.bounds().x_start,
                y_start = region.bounds().y_start,
                "Refinement step complete"
            );

            sink.publish(Frame {
                phase,
                step: i + 1,
                steps,
                budget,
                width: region.width(),
                height: region.height(),
                pixels: region.buffer(),
                elapsed,
            });
        }

        debug!(
            steps_run,
            elapsed_ms = start.elapsed().as_millis(),
            "Refinement done"
        );
        Ok(RefineOutcome {
            phase: RenderPhase::Done,
            completed_budget: region.completed_budget(),
            steps_run,
            elapsed: start.elapsed(),
        })
    }
}
