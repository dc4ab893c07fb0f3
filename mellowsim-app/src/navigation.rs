//! Turns selection events into new regions and drives the history stack.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use mellowsim_core::{ComputeBackend, Region, Selection};
use mellowsim_render::{Channel, Frame, Hsv, ProgressiveRenderer, RefineOutcome, RenderCancel, RenderPhase};

use crate::config::ExplorerConfig;
use crate::display::DisplaySink;
use crate::error::{NavigationError, TourError};
use crate::history::ZoomHistory;
use crate::persistence::Persistence;
use crate::session::NavigationSession;
use crate::tour::load_tour;

/// Owns the navigation path and everything needed to refine and show it.
///
/// All operations run on the caller's thread; the command worker serialises
/// concurrent requests so region construction is never interleaved.
pub struct NavigationController<B, T, D, S> {
    config: ExplorerConfig,
    session: NavigationSession,
    history: ZoomHistory<Hsv<T>>,
    renderer: ProgressiveRenderer<B>,
    display: D,
    store: S,
    cursor: Option<(u32, u32)>,
    /// Cancellation generation the current request was issued under.
    request_generation: Option<u64>,
}

impl<B, T, D, S> NavigationController<B, T, D, S>
where
    B: ComputeBackend,
    T: Channel,
    D: DisplaySink<T>,
    S: Persistence<T>,
{
    /// Build the root region from `config`. Nothing is computed yet; call
    /// [`render_current`](Self::render_current).
    pub fn new(
        config: ExplorerConfig,
        renderer: ProgressiveRenderer<B>,
        display: D,
        store: S,
    ) -> Result<Self, NavigationError> {
        let root = Region::new(config.root_params())?;
        info!(
            width = root.width(),
            height = root.height(),
            budget = root.iteration_budget(),
            backend = %root.backend(),
            "Root region created"
        );
        Ok(Self {
            session: NavigationSession::new(&config.zoom),
            history: ZoomHistory::new(root, config.history_cap),
            config,
            renderer,
            display,
            store,
            cursor: None,
            request_generation: None,
        })
    }

    /// Refine the active region up to its budget, showing every frame.
    pub fn render_current(&mut self) -> Result<RefineOutcome, NavigationError> {
        let top = self.history.top();
        let schedule = self.config.schedule.schedule_for(top.iteration_budget())?;
        let overlay = self.overlay();
        let gen = self
            .request_generation
            .unwrap_or_else(|| self.renderer.cancel_handle().generation());
        let display = &mut self.display;
        let outcome = self.renderer.refine_under(
            self.history.top_mut(),
            &schedule,
            &mut |f: Frame<'_, T>| display.show(f.pixels, f.width, f.height, overlay),
            gen,
        )?;
        if outcome.steps_run == 0 {
            self.show_top();
        }
        Ok(outcome)
    }

    /// Zoom into `selection` of the active region.
    pub fn zoom_in(&mut self, selection: Selection) -> Result<RefineOutcome, NavigationError> {
        let top = self.history.top();
        let selection = selection.clamped(top.width(), top.height());
        let params = top.child_params(selection, self.session.zoom_factor());
        let region = Region::new(params)?;
        info!(
            depth = self.history.depth() + 1,
            magnification = region.magnification(),
            budget = region.iteration_budget(),
            x_start = region.bounds().x_start,
            y_start = region.bounds().y_start,
            "Zooming in"
        );
        self.session.record_selection(selection);
        self.history.push(region);
        self.render_current()
    }

    /// Zoom into the selection centred on `(x, y)`.
    pub fn zoom_at(&mut self, x: u32, y: u32) -> Result<RefineOutcome, NavigationError> {
        let selection = self.selection_at(x, y);
        self.zoom_in(selection)
    }

    /// Return to the previous region. `None` when already at the root.
    pub fn zoom_out(&mut self) -> Result<Option<RefineOutcome>, NavigationError> {
        if self.history.pop().is_none() {
            debug!("Zoom out ignored at root");
            return Ok(None);
        }
        info!(
            depth = self.history.depth(),
            magnification = self.history.top().magnification(),
            "Zooming out"
        );
        self.render_current().map(Some)
    }

    pub fn adjust_zoom_factor(&mut self, delta: f64) -> f64 {
        let factor = self.session.adjust_zoom_factor(delta);
        if self.cursor.is_some() {
            self.show_top();
        }
        factor
    }

    pub fn toggle_overlay(&mut self) -> bool {
        let visible = self.session.toggle_overlay();
        self.display.set_overlay_visible(visible);
        visible
    }

    /// Move the cursor; the overlay follows it.
    pub fn hover(&mut self, x: u32, y: u32) -> Selection {
        self.cursor = Some((x, y));
        self.show_top();
        self.selection_at(x, y)
    }

    /// Selection a click at `(x, y)` would zoom into.
    pub fn selection_at(&self, x: u32, y: u32) -> Selection {
        let top = self.history.top();
        self.session.selection_at(x, y, top.width(), top.height())
    }

    pub fn save_current(&mut self) -> Result<PathBuf, NavigationError> {
        self.store.save(self.history.top())
    }

    /// Zoom at each cursor position in turn.
    ///
    /// Every point is checked against the raster before the first zoom, so a
    /// bad tour leaves navigation untouched. Replay stops early if a
    /// refinement is cancelled. Returns the number of zooms performed.
    pub fn replay_tour(&mut self, coords: &[(u32, u32)]) -> Result<usize, NavigationError> {
        let (w, h) = (self.history.top().width(), self.history.top().height());
        if let Some(&(x, y)) = coords.iter().find(|&&(x, y)| x >= w || y >= h) {
            return Err(TourError::OutOfBounds { x, y }.into());
        }
        for (i, &(x, y)) in coords.iter().enumerate() {
            let outcome = self.zoom_at(x, y)?;
            if outcome.phase == RenderPhase::Cancelled {
                info!(zooms = i + 1, "Tour replay interrupted");
                return Ok(i + 1);
            }
        }
        info!(zooms = coords.len(), "Tour replayed");
        Ok(coords.len())
    }

    /// Load, rescale to the live raster width, and replay a tour file.
    pub fn replay_tour_file(&mut self, path: &Path) -> Result<usize, NavigationError> {
        let width = self.history.top().width();
        let points = load_tour(path)
            .and_then(|tour| tour.rescale(width))
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "Tour rejected");
                e
            })?;
        self.replay_tour(&points).map_err(|e| {
            if let NavigationError::Tour(ref t) = e {
                warn!(path = %path.display(), error = %t, "Tour rejected");
            }
            e
        })
    }

    /// Run the following refinements under `generation`, so a request that
    /// was superseded while queued is cancelled before it computes. `None`
    /// uses the generation current when each refinement starts.
    pub fn set_request_generation(&mut self, generation: Option<u64>) {
        self.request_generation = generation;
    }

    pub fn cancel_handle(&self) -> Arc<RenderCancel> {
        self.renderer.cancel_handle()
    }

    pub fn history(&self) -> &ZoomHistory<Hsv<T>> {
        &self.history
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn overlay(&self) -> Option<Selection> {
        if !self.session.overlay_visible() {
            return None;
        }
        self.cursor.map(|(x, y)| self.selection_at(x, y))
    }

    fn show_top(&mut self) {
        let overlay = self.overlay();
        let top = self.history.top();
        if top.is_rendered() {
            self.display
                .show(top.buffer(), top.width(), top.height(), overlay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoomSettings;
    use crate::display::NullDisplay;
    use mellowsim_render::{ColorParams, WorkerPoolBackend};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(u32, u32, Option<Selection>)>,
        overlay: Vec<bool>,
    }

    impl DisplaySink<u8> for Recorder {
        fn show(&mut self, _pixels: &[Hsv<u8>], width: u32, height: u32, overlay: Option<Selection>) {
            self.frames.push((width, height, overlay));
        }

        fn set_overlay_visible(&mut self, visible: bool) {
            self.overlay.push(visible);
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Vec<(u64, u32)>,
    }

    impl Persistence<u8> for MemoryStore {
        fn save(&mut self, region: &Region<Hsv<u8>>) -> Result<PathBuf, NavigationError> {
            self.saved
                .push((region.magnification(), region.iteration_budget()));
            Ok(PathBuf::from(format!("{}.png", self.saved.len())))
        }
    }

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            width: 64,
            base_iter: 100,
            ..ExplorerConfig::default()
        }
    }

    fn controller<D: DisplaySink<u8>>(
        config: ExplorerConfig,
        display: D,
    ) -> NavigationController<WorkerPoolBackend, u8, D, MemoryStore> {
        let backend = WorkerPoolBackend::new(2, 256).unwrap();
        let renderer = ProgressiveRenderer::new(backend, ColorParams::default(), 2.0).unwrap();
        NavigationController::new(config, renderer, display, MemoryStore::default()).unwrap()
    }

    #[test]
    fn zoom_in_accumulates_magnification() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        assert_eq!(nav.session().last_selection(), None);
        nav.zoom_at(32, 18).unwrap();
        nav.zoom_at(10, 10).unwrap();
        assert_eq!(nav.session().last_selection(), Some(nav.selection_at(10, 10)));
        assert_eq!(nav.history().depth(), 2);
        assert_eq!(nav.history().top().magnification(), 25);
        assert!(nav.history().top().is_fully_refined());
        assert!(
            nav.history().top().iteration_budget() > nav.history().root().iteration_budget()
        );
    }

    #[test]
    fn magnification_follows_every_zoom_factor_in_range() {
        let zoom = ZoomSettings::default();
        for zf in [zoom.min, 0.05, 0.1, 0.2, 0.25, 1.0 / 3.0, 0.4, zoom.max] {
            let mut cfg = config();
            cfg.zoom.factor = zf;
            let mut nav = controller(cfg, NullDisplay);
            nav.render_current().unwrap();
            let mut prev = (1u64, nav.history().top().iteration_budget());
            for _ in 0..2 {
                nav.zoom_at(32, 18).unwrap();
                let top = nav.history().top();
                assert_eq!(
                    top.magnification(),
                    (prev.0 as f64 / zf).round() as u64,
                    "zoom factor {zf}"
                );
                assert!(top.iteration_budget() >= prev.1, "zoom factor {zf}");
                prev = (top.magnification(), top.iteration_budget());
            }
        }
    }

    #[test]
    fn zoom_out_restores_previous_region() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        let root_bounds = nav.history().top().bounds();
        nav.zoom_at(20, 20).unwrap();
        let outcome = nav.zoom_out().unwrap().unwrap();
        assert_eq!(outcome.steps_run, 0);
        assert_eq!(nav.history().top().bounds(), root_bounds);
        assert_eq!(nav.history().top().magnification(), 1);
        assert!(nav.zoom_out().unwrap().is_none());
    }

    #[test]
    fn frames_carry_overlay_only_when_visible() {
        let mut nav = controller(config(), Recorder::default());
        nav.render_current().unwrap();
        assert!(nav.display().frames.iter().all(|f| f.2.is_none()));

        let sel = nav.hover(32, 18);
        assert_eq!(nav.display().frames.last().unwrap().2, Some(sel));
        assert!(!nav.toggle_overlay());
        nav.hover(5, 5);
        assert_eq!(nav.display().frames.last().unwrap().2, None);
        assert_eq!(nav.display().overlay, vec![false]);
    }

    #[test]
    fn adjusting_zoom_factor_changes_next_selection() {
        let mut nav = controller(config(), NullDisplay);
        let before = nav.selection_at(32, 18);
        nav.adjust_zoom_factor(1.0);
        nav.adjust_zoom_factor(1.0);
        let after = nav.selection_at(32, 18);
        assert!(after.width > before.width);
        assert!((nav.session().zoom_factor() - 0.2 * 1.1 * 1.1).abs() < 1e-12);
    }

    #[test]
    fn save_current_uses_store() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        let path = nav.save_current().unwrap();
        assert_eq!(path, PathBuf::from("1.png"));
        assert_eq!(nav.store().saved, vec![(1, 100)]);
    }

    #[test]
    fn out_of_bounds_tour_leaves_state_untouched() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        let result = nav.replay_tour(&[(10, 10), (64, 10)]);
        assert!(matches!(
            result,
            Err(NavigationError::Tour(TourError::OutOfBounds { x: 64, y: 10 }))
        ));
        assert_eq!(nav.history().depth(), 0);
    }

    #[test]
    fn superseded_request_is_cancelled() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        let cancel = nav.cancel_handle();
        let issued = cancel.cancel();
        cancel.cancel();

        nav.set_request_generation(Some(issued));
        let outcome = nav.zoom_at(32, 18).unwrap();
        assert_eq!(outcome.phase, RenderPhase::Cancelled);
        assert_eq!(outcome.completed_budget, None);
        assert_eq!(nav.history().depth(), 1);

        nav.set_request_generation(None);
        assert_eq!(nav.render_current().unwrap().phase, RenderPhase::Done);
    }

    #[test]
    fn tour_replays_each_point() {
        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        assert_eq!(nav.replay_tour(&[(32, 18), (32, 18), (32, 18)]).unwrap(), 3);
        assert_eq!(nav.history().depth(), 3);
        assert_eq!(nav.history().top().magnification(), 125);
    }

    #[test]
    fn incompatible_tour_file_is_recoverable() {
        let dir = std::env::temp_dir().join("mellowsim_test_nav_tour");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("tour.txt");
        std::fs::write(&path, "48\n10,10\n").unwrap();

        let mut nav = controller(config(), NullDisplay);
        nav.render_current().unwrap();
        let result = nav.replay_tour_file(&path);
        assert!(matches!(
            result,
            Err(NavigationError::Tour(TourError::IncompatibleWidth { recorded: 48, live: 64 }))
        ));
        assert_eq!(nav.history().depth(), 0);

        let missing = nav.replay_tour_file(&dir.join("missing.txt"));
        assert!(matches!(missing, Err(NavigationError::Tour(TourError::NotFound(_)))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
