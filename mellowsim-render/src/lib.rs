pub mod accelerator;
pub mod backend;
pub mod buffer;
pub mod channel;
pub mod color;
pub mod error;
pub mod export;
pub mod progressive;
pub mod worker_pool;

pub use accelerator::{AcceleratorBackend, Device, HostDevice, KernelJob};
pub use backend::Backend;
pub use buffer::RenderBuffer;
pub use channel::Channel;
pub use color::{color, colorize, ColorParams, Hsv};
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use progressive::{
    BudgetSchedule, Frame, FrameSink, ProgressiveRenderer, RefineOutcome, RenderCancel,
    RenderPhase, ScheduleParams,
};
pub use worker_pool::{WorkerPoolBackend, DEFAULT_BLOCK_SIZE};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
