use mellowsim_app::{
    spawn_command_worker, Command, Event, ExplorerConfig, ImageStore, NavigationController,
    NullDisplay,
};
use mellowsim_core::BackendKind;
use mellowsim_render::{Backend, ColorParams, ProgressiveRenderer};

fn config(backend: BackendKind) -> ExplorerConfig {
    ExplorerConfig {
        width: 96,
        base_iter: 200,
        backend,
        workers: 2,
        block_size: 512,
        history_cap: Some(3),
        ..ExplorerConfig::default()
    }
}

fn controller(
    config: ExplorerConfig,
    out: &str,
) -> NavigationController<Backend, u16, NullDisplay, ImageStore> {
    let backend = Backend::build(config.backend, config.workers, config.block_size).unwrap();
    let renderer = ProgressiveRenderer::new(backend, ColorParams::default(), 2.0).unwrap();
    let store = ImageStore::new(std::env::temp_dir().join(out), 180.0, 2.0);
    NavigationController::new(config, renderer, NullDisplay, store).unwrap()
}

#[test]
fn tour_file_replay_and_save() {
    let dir = std::env::temp_dir().join("mellowsim_it_tour");
    let _ = std::fs::create_dir_all(&dir);
    let tour = dir.join("tour.txt");
    // Captured at half the live width.
    std::fs::write(&tour, "48\n24,13\n20,10\n30,15\n").unwrap();

    let mut nav = controller(config(BackendKind::Accelerator), "mellowsim_it_tour_out");
    nav.render_current().unwrap();
    assert_eq!(nav.replay_tour_file(&tour).unwrap(), 3);
    assert_eq!(nav.history().depth(), 3);
    assert_eq!(nav.history().top().magnification(), 125);

    let saved = nav.save_current().unwrap();
    assert!(saved.exists());
    let decoder = png::Decoder::new(std::fs::File::open(&saved).unwrap());
    let reader = decoder.read_info().unwrap();
    assert_eq!(reader.info().bit_depth, png::BitDepth::Sixteen);
    assert!(reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .any(|t| t.keyword == "MellowSim.Magnification" && t.text == "125"));

    let _ = std::fs::remove_dir_all(&dir);
    let _ = std::fs::remove_dir_all(std::env::temp_dir().join("mellowsim_it_tour_out"));
}

#[test]
fn evicted_regions_are_recomputed_on_return() {
    let mut nav = controller(config(BackendKind::WorkerPool), "mellowsim_it_evict_out");
    nav.render_current().unwrap();
    for _ in 0..4 {
        nav.zoom_at(48, 27).unwrap();
    }
    let retained = nav.history().iter().filter(|r| r.is_rendered()).count();
    assert_eq!(retained, 3);

    while nav.history().depth() > 0 {
        let outcome = nav.zoom_out().unwrap().unwrap();
        assert_eq!(outcome.completed_budget, Some(nav.history().top().iteration_budget()));
        assert!(nav.history().top().is_fully_refined());
    }
    assert_eq!(nav.history().top().magnification(), 1);
}

#[test]
fn worker_serves_a_navigation_session() {
    let nav = controller(config(BackendKind::WorkerPool), "mellowsim_it_worker_out");
    let (handle, events, join) = spawn_command_worker(nav);
    handle.send(Command::AdjustZoomFactor(-1.0));
    handle.send(Command::Hover { x: 10, y: 10 });
    handle.send(Command::ZoomAt { x: 10, y: 10 });
    handle.send(Command::ZoomOut);
    handle.send(Command::ZoomOut);
    drop(handle);
    let nav = join.join().unwrap();

    let events: Vec<Event> = events.iter().collect();
    assert_eq!(events.len(), 5);
    assert!(matches!(events[0], Event::ZoomFactor(f) if (f - 0.18).abs() < 1e-12));
    assert!(matches!(events[1], Event::Selection(s) if s.x == 2 && s.y == 5));
    assert!(matches!(events[2], Event::Refined { depth: 1, .. }));
    assert!(matches!(events[3], Event::Refined { depth: 0, magnification: 1, .. }));
    assert!(matches!(events[4], Event::AtRoot));
    assert_eq!(nav.history().depth(), 0);
}
