use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use mellowsim_core::Region;
use mellowsim_render::{export_png, Channel, ExportMetadata, Hsv};

use crate::error::NavigationError;

/// Where finished regions are written.
pub trait Persistence<T> {
    /// Write `region` and return the path written.
    fn save(&mut self, region: &Region<Hsv<T>>) -> Result<PathBuf, NavigationError>;
}

/// Saves regions as PNG files named by the Unix time of the save.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    hue_range: f64,
    escape_radius: f64,
}

impl ImageStore {
    pub fn new(dir: PathBuf, hue_range: f64, escape_radius: f64) -> Self {
        Self {
            dir,
            hue_range,
            escape_radius,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<unix-seconds>.png`, or `<unix-seconds>-<n>.png` if that exists.
    fn next_path(&self) -> PathBuf {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut path = self.dir.join(format!("{secs}.png"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{secs}-{n}.png"));
            n += 1;
        }
        path
    }
}

impl<T: Channel> Persistence<T> for ImageStore {
    fn save(&mut self, region: &Region<Hsv<T>>) -> Result<PathBuf, NavigationError> {
        let metadata = ExportMetadata::from_region(region, self.escape_radius)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        export_png(region.buffer(), self.hue_range, &path, &metadata)?;
        info!(
            path = %path.display(),
            magnification = metadata.magnification,
            budget = metadata.iteration_budget,
            "Saved region"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellowsim_core::{BackendKind, Bounds, ContinuationState, RegionParams};
    use mellowsim_render::RenderError;

    fn region() -> Region<Hsv<u8>> {
        Region::new(RegionParams {
            bounds: Bounds::new(-2.7, 1.2, 1.2, -1.2),
            width: 16,
            aspect_ratio: 16.0 / 9.0,
            magnification: 1,
            base_iter: 50,
            backend: BackendKind::WorkerPool,
        })
        .unwrap()
    }

    #[test]
    fn saves_get_distinct_timestamped_names() {
        let dir = std::env::temp_dir().join("mellowsim_test_store");
        let _ = std::fs::remove_dir_all(&dir);
        let mut store = ImageStore::new(dir.clone(), 180.0, 2.0);

        let mut r = region();
        let n = r.pixel_count();
        let state =
            ContinuationState::cold(&r.real_samples(), &r.imag_samples(), 50, 4.0).unwrap();
        r.commit_step(50, vec![0; n], vec![Hsv::default(); n], state)
            .unwrap();

        let first = store.save(&r).unwrap();
        let second = store.save(&r).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        let name = first.file_stem().unwrap().to_string_lossy().to_string();
        assert!(name.parse::<u64>().is_ok(), "stem is a unix timestamp: {name}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unrendered_region_is_rejected() {
        let dir = std::env::temp_dir().join("mellowsim_test_store_empty");
        let mut store = ImageStore::new(dir, 180.0, 2.0);
        let result = Persistence::<u8>::save(&mut store, &region());
        assert!(matches!(
            result,
            Err(NavigationError::Render(RenderError::NotRendered))
        ));
    }
}
