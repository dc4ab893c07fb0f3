pub mod app_dir;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod navigation;
pub mod persistence;
pub mod session;
pub mod tour;
pub mod worker;

pub use config::{ExplorerConfig, ZoomSettings};
pub use display::{DisplaySink, LogDisplay, NullDisplay};
pub use error::{NavigationError, TourError};
pub use history::ZoomHistory;
pub use navigation::NavigationController;
pub use persistence::{ImageStore, Persistence};
pub use session::NavigationSession;
pub use tour::{load_tour, Tour};
pub use worker::{spawn_command_worker, Command, CommandHandle, Event};
