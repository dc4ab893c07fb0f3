use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mellowsim_core::{BackendKind, Bounds, RegionParams};
use mellowsim_render::{ColorParams, ScheduleParams, DEFAULT_BLOCK_SIZE};

// ---------------------------------------------------------------------------
// Zoom settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomSettings {
    /// Initial fraction of the raster covered by a selection.
    #[serde(default = "default_zoom_factor")]
    pub factor: f64,
    #[serde(default = "default_min_zoom")]
    pub min: f64,
    #[serde(default = "default_max_zoom")]
    pub max: f64,
    /// Relative change per adjustment: the factor is multiplied by `1 ± step`.
    #[serde(default = "default_change_step")]
    pub change_step: f64,
}

fn default_zoom_factor() -> f64 {
    0.2
}
fn default_min_zoom() -> f64 {
    0.01
}
fn default_max_zoom() -> f64 {
    0.5
}
fn default_change_step() -> f64 {
    0.1
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            factor: default_zoom_factor(),
            min: default_min_zoom(),
            max: default_max_zoom(),
            change_step: default_change_step(),
        }
    }
}

// ---------------------------------------------------------------------------
// Explorer configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Raster width in pixels; height follows from the aspect ratio.
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
    #[serde(default = "default_root_bounds")]
    pub root_bounds: Bounds,
    #[serde(default = "default_base_iter")]
    pub base_iter: u32,
    #[serde(default = "default_escape_radius")]
    pub escape_radius: f64,
    #[serde(default)]
    pub zoom: ZoomSettings,
    #[serde(default)]
    pub backend: BackendKind,
    /// Worker threads (or accelerator threads). `0` uses every processing unit.
    #[serde(default)]
    pub workers: usize,
    /// Pixels per worker-pool block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default)]
    pub schedule: ScheduleParams,
    #[serde(default)]
    pub color: ColorParams,
    /// Export directory. When empty, an `images/` folder next to the executable is used.
    #[serde(default)]
    pub output_dir: String,
    /// Maximum number of history regions that keep their buffers. `None` keeps all.
    #[serde(default)]
    pub history_cap: Option<usize>,
}

fn default_width() -> u32 {
    1024
}
fn default_aspect_ratio() -> f64 {
    16.0 / 9.0
}
fn default_root_bounds() -> Bounds {
    Bounds::new(-2.7, 1.2, 1.2, -1.2)
}
fn default_base_iter() -> u32 {
    1000
}
fn default_escape_radius() -> f64 {
    2.0
}
fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            aspect_ratio: default_aspect_ratio(),
            root_bounds: default_root_bounds(),
            base_iter: default_base_iter(),
            escape_radius: default_escape_radius(),
            zoom: ZoomSettings::default(),
            backend: BackendKind::default(),
            workers: 0,
            block_size: default_block_size(),
            schedule: ScheduleParams::default(),
            color: ColorParams::default(),
            output_dir: String::new(),
            history_cap: None,
        }
    }
}

impl ExplorerConfig {
    /// Load the configuration next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&crate::app_dir::config_path())
    }

    /// Load from `path`, falling back to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<ExplorerConfig>(&json) {
                    Ok(config) => {
                        info!("Loaded configuration from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        error!("Failed to parse configuration: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read configuration file: {e}");
                }
            }
        } else {
            debug!("No configuration file at {}", path.display());
        }
        Self::default()
    }

    /// Persist the configuration next to the executable.
    pub fn save(&self) {
        self.save_to(&crate::app_dir::config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write configuration: {e}");
                } else {
                    debug!("Saved configuration to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize configuration: {e}"),
        }
    }

    /// Parameters of the root region.
    pub fn root_params(&self) -> RegionParams {
        RegionParams {
            bounds: self.root_bounds,
            width: self.width,
            aspect_ratio: self.aspect_ratio,
            magnification: 1,
            base_iter: self.base_iter,
            backend: self.backend,
        }
    }

    /// Directory exported images are written to.
    pub fn output_directory(&self) -> PathBuf {
        crate::app_dir::resolve(&self.output_dir, crate::app_dir::images_directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: ExplorerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExplorerConfig::default());
        assert_eq!(config.width, 1024);
        assert_eq!(config.zoom.factor, 0.2);
        assert_eq!(config.schedule.multiple, 4);
        assert_eq!(config.block_size, 16_384);
        assert_eq!(config.history_cap, None);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let json = r#"{ "width": 640, "backend": "accelerator", "zoom": { "factor": 0.3 } }"#;
        let config: ExplorerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.backend, BackendKind::Accelerator);
        assert_eq!(config.zoom.factor, 0.3);
        assert_eq!(config.zoom.max, 0.5);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("mellowsim_test_config");
        let path = dir.join("mellowsim.json");
        let config = ExplorerConfig {
            width: 800,
            history_cap: Some(4),
            ..ExplorerConfig::default()
        };
        config.save_to(&path);
        assert_eq!(ExplorerConfig::load_from(&path), config);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("mellowsim_test_config_bad");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("mellowsim.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ExplorerConfig::load_from(&path), ExplorerConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn root_params_start_at_unit_magnification() {
        let params = ExplorerConfig::default().root_params();
        assert_eq!(params.magnification, 1);
        assert_eq!(params.width, 1024);
    }
}
