use mellowsim_core::{
    advance_block, BackendKind, Bounds, ContinuationState, PixelState, Region, RegionParams,
    Selection,
};

fn small_root() -> Region<u8> {
    Region::new(RegionParams {
        bounds: Bounds::new(-2.7, 1.2, 1.2, -1.2),
        width: 96,
        aspect_ratio: 16.0 / 9.0,
        magnification: 1,
        base_iter: 200,
        backend: BackendKind::WorkerPool,
    })
    .unwrap()
}

/// Run every pixel of a region's sample grid cold to `max_iter` on one thread.
fn counts_for(region: &Region<u8>, max_iter: u32) -> Vec<u32> {
    let real = region.real_samples();
    let imag = region.imag_samples();
    let state = ContinuationState::cold(&real, &imag, max_iter, 4.0).unwrap();
    let mut pixels = state.pixels().to_vec();
    let mut counts = vec![0; pixels.len()];
    advance_block(&real, &imag, 0, &mut pixels, &mut counts, max_iter, 4.0);
    counts
}

#[test]
fn root_grid_has_members_and_escapees() {
    let root = small_root();
    let counts = counts_for(&root, 200);
    assert_eq!(counts.len(), root.pixel_count());
    assert!(counts.iter().any(|&c| c == 0), "some pixels are set members");
    assert!(counts.iter().any(|&c| c > 0), "some pixels escape");
}

#[test]
fn split_grid_matches_single_pass() {
    let root = small_root();
    let real = root.real_samples();
    let imag = root.imag_samples();
    let state = ContinuationState::cold(&real, &imag, 300, 4.0).unwrap();

    let mut whole = state.pixels().to_vec();
    let mut whole_counts = vec![0; whole.len()];
    advance_block(&real, &imag, 0, &mut whole, &mut whole_counts, 300, 4.0);

    // Same grid in uneven chunks, each knowing its global offset.
    let mut pieces: Vec<PixelState> = state.pixels().to_vec();
    let mut piece_counts = vec![0; pieces.len()];
    let mut start = 0;
    for (px, cnt) in pieces.chunks_mut(701).zip(piece_counts.chunks_mut(701)) {
        advance_block(&real, &imag, start, px, cnt, 300, 4.0);
        start += px.len();
    }
    assert_eq!(whole, pieces);
    assert_eq!(whole_counts, piece_counts);
}

#[test]
fn nested_zoom_keeps_raster_and_grows_budget() {
    let root = small_root();
    let sel = Selection::centered(48, 27, 19, 10, root.width(), root.height());
    let child: Region<u8> = Region::new(root.child_params(sel, 0.2)).unwrap();
    assert_eq!(child.width(), root.width());
    assert_eq!(child.height(), root.height());
    assert_eq!(child.magnification(), 5);
    assert!(child.iteration_budget() > root.iteration_budget());
    assert!(child.x_step() < root.x_step());
}
