//! The zoom-history stack: the navigation path from the root region to the
//! active one.

use tracing::debug;

use mellowsim_core::Region;

/// Ordered regions from root (index 0) to the active top.
///
/// Never empty; the root is never removed. With a retention cap, the oldest
/// buffers between root and top are evicted and must be refined again when
/// navigation returns to them.
#[derive(Debug)]
pub struct ZoomHistory<P> {
    regions: Vec<Region<P>>,
    cap: Option<usize>,
}

impl<P: Clone + Default> ZoomHistory<P> {
    pub fn new(mut root: Region<P>, cap: Option<usize>) -> Self {
        root.set_active(true);
        Self {
            regions: vec![root],
            cap,
        }
    }

    /// Make `region` the active top. The previous top keeps its buffer but
    /// drops its continuation state.
    pub fn push(&mut self, mut region: Region<P>) {
        let top = self.top_mut();
        top.set_active(false);
        top.discard_continuation();
        region.set_active(true);
        self.regions.push(region);
        self.enforce_cap();
        debug!(depth = self.depth(), "Region pushed");
    }

    /// Remove the top and reactivate the one below. `None` at the root.
    pub fn pop(&mut self) -> Option<Region<P>> {
        if self.regions.len() == 1 {
            return None;
        }
        let mut popped = self.regions.pop()?;
        popped.set_active(false);
        let top = self.top_mut();
        top.set_active(true);
        if !top.is_rendered() {
            top.reset_buffers();
        }
        debug!(depth = self.depth(), "Region popped");
        Some(popped)
    }

    fn enforce_cap(&mut self) {
        let Some(cap) = self.cap else {
            return;
        };
        // The top counts as retained even before its first step completes.
        let last = self.regions.len() - 1;
        let mut retained = self.regions[..last].iter().filter(|r| r.is_rendered()).count() + 1;
        for (depth, region) in self.regions.iter_mut().enumerate().take(last).skip(1) {
            if retained <= cap {
                break;
            }
            if region.is_rendered() {
                region.evict();
                retained -= 1;
                debug!(depth, "Evicted history buffer");
            }
        }
    }
}

impl<P> ZoomHistory<P> {
    pub fn top(&self) -> &Region<P> {
        // Never empty.
        &self.regions[self.regions.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut Region<P> {
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }

    pub fn root(&self) -> &Region<P> {
        &self.regions[0]
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of zooms below the top (`0` at the root).
    pub fn depth(&self) -> usize {
        self.regions.len() - 1
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region<P>> {
        self.regions.iter()
    }
}
