use mellowsim_core::{BackendKind, Bounds, ComputeBackend, Region, RegionParams, Selection};
use mellowsim_render::{
    Backend, BudgetSchedule, ColorParams, Frame, Hsv, ProgressiveRenderer, RenderBuffer,
    RenderPhase, ScheduleParams,
};

fn root(width: u32, backend: BackendKind) -> RegionParams {
    RegionParams {
        bounds: Bounds::new(-2.7, 1.2, 1.2, -1.2),
        width,
        aspect_ratio: 16.0 / 9.0,
        magnification: 1,
        base_iter: 1000,
        backend,
    }
}

fn renderer(kind: BackendKind) -> ProgressiveRenderer<Backend> {
    let backend = Backend::build(kind, 4, 512).unwrap();
    ProgressiveRenderer::new(backend, ColorParams::default(), 2.0).unwrap()
}

#[test]
fn end_to_end_root_refinement() {
    let r = renderer(BackendKind::WorkerPool);
    let mut region = Region::<Hsv<u8>>::new(root(160, BackendKind::WorkerPool)).unwrap();
    let schedule = ScheduleParams::default()
        .schedule_for(region.iteration_budget())
        .unwrap();
    assert_eq!(schedule.budgets(), &[100, 400, 1000]);

    let outcome = r
        .refine(&mut region, &schedule, &mut |_: Frame<'_, u8>| {})
        .unwrap();
    assert_eq!(outcome.phase, RenderPhase::Done);
    assert!(region.is_fully_refined());

    let rgba = RenderBuffer::from_hsv(region.width(), region.height(), region.buffer(), 180.0);
    let has_non_black = rgba
        .pixels
        .chunks_exact(4)
        .any(|px| px[0] > 0 || px[1] > 0 || px[2] > 0);
    assert!(has_non_black, "rendered image should contain non-black pixels");
    assert!(region.counts().contains(&0), "root view contains set members");
}

#[test]
fn strategies_agree_on_progressive_frames() {
    let schedule = BudgetSchedule::from_budgets(vec![50, 200, 1000]).unwrap();
    let mut frames = Vec::new();
    for kind in [BackendKind::WorkerPool, BackendKind::Accelerator] {
        let r = renderer(kind);
        let mut region = Region::<Hsv<u16>>::new(root(120, kind)).unwrap();
        let mut published = Vec::new();
        r.refine(&mut region, &schedule, &mut |f: Frame<'_, u16>| {
            published.push(f.pixels.to_vec())
        })
        .unwrap();
        frames.push(published);
    }
    assert_eq!(frames[0], frames[1]);
}

#[test]
fn warm_refinement_equals_single_cold_step() {
    let r = renderer(BackendKind::Accelerator);
    let mut warm = Region::<Hsv<f32>>::new(root(96, BackendKind::Accelerator)).unwrap();
    let mut cold = Region::<Hsv<f32>>::new(root(96, BackendKind::Accelerator)).unwrap();

    let stepped = BudgetSchedule::geometric(1000, 10, 3).unwrap();
    let single = BudgetSchedule::from_budgets(vec![1000]).unwrap();
    r.refine(&mut warm, &stepped, &mut |_: Frame<'_, f32>| {}).unwrap();
    r.refine(&mut cold, &single, &mut |_: Frame<'_, f32>| {}).unwrap();

    assert_eq!(warm.counts(), cold.counts());
    assert_eq!(warm.buffer(), cold.buffer());
}

#[test]
fn zoomed_child_refines_at_larger_budget() {
    let r = renderer(BackendKind::WorkerPool);
    let parent = Region::<Hsv<u8>>::new(root(128, BackendKind::WorkerPool)).unwrap();
    let selection = Selection::centered(40, 36, 26, 14, parent.width(), parent.height());
    let mut child = Region::<Hsv<u8>>::new(parent.child_params(selection, 0.2)).unwrap();
    assert_eq!(child.magnification(), 5);
    assert!(child.iteration_budget() > parent.iteration_budget());

    let schedule = ScheduleParams::default()
        .schedule_for(child.iteration_budget())
        .unwrap();
    r.refine(&mut child, &schedule, &mut |_: Frame<'_, u8>| {}).unwrap();
    assert_eq!(child.completed_budget(), Some(child.iteration_budget()));

    let direct = r
        .backend()
        .compute_full(
            &child.real_samples(),
            &child.imag_samples(),
            child.iteration_budget(),
            4.0,
        )
        .unwrap();
    assert_eq!(child.counts(), direct.counts.as_slice());
}
