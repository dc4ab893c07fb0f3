use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use mellowsim_core::{ComputeBackend, Selection};
use mellowsim_render::{Channel, RefineOutcome, RenderCancel};

use crate::display::DisplaySink;
use crate::error::NavigationError;
use crate::navigation::NavigationController;
use crate::persistence::Persistence;

/// Request sent to the command worker.
#[derive(Debug, Clone)]
pub enum Command {
    ZoomIn(Selection),
    /// Zoom into the selection centred on a cursor position.
    ZoomAt { x: u32, y: u32 },
    ZoomOut,
    AdjustZoomFactor(f64),
    ToggleOverlay,
    Hover { x: u32, y: u32 },
    Save,
    ReplayTour(Vec<(u32, u32)>),
    ReplayTourFile(PathBuf),
}

impl Command {
    /// Whether this command replaces the region being refined.
    pub fn supersedes_refinement(&self) -> bool {
        matches!(
            self,
            Self::ZoomIn(_)
                | Self::ZoomAt { .. }
                | Self::ZoomOut
                | Self::ReplayTour(_)
                | Self::ReplayTourFile(_)
        )
    }
}

/// Response sent back from the command worker.
#[derive(Debug)]
pub enum Event {
    Refined {
        depth: usize,
        magnification: u64,
        outcome: RefineOutcome,
    },
    /// A zoom out was requested at the root.
    AtRoot,
    ZoomFactor(f64),
    Overlay(bool),
    Selection(Selection),
    Saved(PathBuf),
    TourReplayed { zooms: usize },
    Failed(NavigationError),
}

/// A queued command with the cancellation generation it was issued under.
struct Request {
    command: Command,
    generation: Option<u64>,
}

/// Send side of the command queue.
///
/// Sending a zoom first cancels any in-flight refinement, so the worker picks
/// the new request up at the next step boundary. Each zoom carries the
/// generation it created, so one still queued when a newer zoom arrives is
/// cancelled before it computes.
#[derive(Clone)]
pub struct CommandHandle {
    // Held across cancel and send so queue order matches generation order.
    tx: Arc<Mutex<mpsc::Sender<Request>>>,
    cancel: Arc<RenderCancel>,
}

impl CommandHandle {
    /// Queue `command`. Returns `false` once the worker has exited.
    pub fn send(&self, command: Command) -> bool {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = command
            .supersedes_refinement()
            .then(|| self.cancel.cancel());
        tx.send(Request {
            command,
            generation,
        })
        .is_ok()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Spawn the command worker thread owning `controller`.
///
/// Commands are processed one at a time in arrival order. The thread runs
/// until every [`CommandHandle`] is dropped, then hands the controller back
/// through the join handle.
pub fn spawn_command_worker<B, T, D, S>(
    controller: NavigationController<B, T, D, S>,
) -> (
    CommandHandle,
    mpsc::Receiver<Event>,
    JoinHandle<NavigationController<B, T, D, S>>,
)
where
    B: ComputeBackend + 'static,
    T: Channel,
    D: DisplaySink<T> + Send + 'static,
    S: Persistence<T> + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<Request>();
    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let cancel = controller.cancel_handle();

    let join = thread::Builder::new()
        .name("command-worker".into())
        .spawn(move || {
            let mut controller = controller;
            debug!("Command worker thread started");
            while let Ok(Request {
                command,
                generation,
            }) = cmd_rx.recv()
            {
                controller.set_request_generation(generation);
                let event = execute(&mut controller, command);
                controller.set_request_generation(None);
                if let Event::Failed(ref e) = event {
                    error!("Command failed: {e}");
                }
                if event_tx.send(event).is_err() {
                    debug!("Event receiver dropped");
                }
            }
            debug!("Command worker thread exiting");
            controller
        })
        .expect("Failed to spawn command worker thread");

    let handle = CommandHandle {
        tx: Arc::new(Mutex::new(cmd_tx)),
        cancel,
    };
    (handle, event_rx, join)
}

fn execute<B, T, D, S>(nav: &mut NavigationController<B, T, D, S>, command: Command) -> Event
where
    B: ComputeBackend,
    T: Channel,
    D: DisplaySink<T>,
    S: Persistence<T>,
{
    let refined = |nav: &NavigationController<B, T, D, S>, outcome: RefineOutcome| Event::Refined {
        depth: nav.history().depth(),
        magnification: nav.history().top().magnification(),
        outcome,
    };
    let result = match command {
        Command::ZoomIn(selection) => nav.zoom_in(selection).map(|o| refined(&*nav, o)),
        Command::ZoomAt { x, y } => nav.zoom_at(x, y).map(|o| refined(&*nav, o)),
        Command::ZoomOut => nav
            .zoom_out()
            .map(|o| o.map_or(Event::AtRoot, |o| refined(&*nav, o))),
        Command::AdjustZoomFactor(delta) => Ok(Event::ZoomFactor(nav.adjust_zoom_factor(delta))),
        Command::ToggleOverlay => Ok(Event::Overlay(nav.toggle_overlay())),
        Command::Hover { x, y } => Ok(Event::Selection(nav.hover(x, y))),
        Command::Save => nav.save_current().map(Event::Saved),
        Command::ReplayTour(points) => nav
            .replay_tour(&points)
            .map(|zooms| Event::TourReplayed { zooms }),
        Command::ReplayTourFile(path) => nav
            .replay_tour_file(&path)
            .map(|zooms| Event::TourReplayed { zooms }),
    };
    result.unwrap_or_else(Event::Failed)
}
