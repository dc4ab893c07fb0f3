use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use mellowsim_app::{ExplorerConfig, ImageStore, LogDisplay, NavigationController, NavigationError};
use mellowsim_render::{Backend, ProgressiveRenderer};

fn run(tour: Option<PathBuf>) -> Result<(), NavigationError> {
    let config = ExplorerConfig::load();
    if !mellowsim_app::app_dir::config_path().exists() {
        // Leave an editable copy of the defaults next to the executable.
        config.save();
    }
    let backend = Backend::build(config.backend, config.workers, config.block_size)?;
    let renderer = ProgressiveRenderer::new(backend, config.color, config.escape_radius)?;
    let hue_range = config.color.hue_range;
    let store = ImageStore::new(config.output_directory(), hue_range, config.escape_radius);
    let mut nav: NavigationController<_, u8, _, _> =
        NavigationController::new(config, renderer, LogDisplay::new(hue_range), store)?;

    nav.render_current()?;
    if let Some(path) = tour {
        nav.replay_tour_file(&path)?;
    }
    let path = nav.save_current()?;
    info!(
        path = %path.display(),
        depth = nav.history().depth(),
        magnification = nav.history().top().magnification(),
        frames = nav.display().frames(),
        selection = ?nav.session().last_selection(),
        "Done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting MellowSim");

    let tour = std::env::args_os().nth(1).map(PathBuf::from);
    match run(tour) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
