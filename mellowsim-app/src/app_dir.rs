//! Locations next to the executable, so a standalone binary keeps its config
//! and exported images beside itself.

use std::path::{Path, PathBuf};

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Default directory for exported images.
pub fn images_directory() -> PathBuf {
    exe_directory().join("images")
}

/// Path of the explorer configuration file.
pub fn config_path() -> PathBuf {
    exe_directory().join("mellowsim.json")
}

/// Resolve a configured path: empty means `fallback`, relative paths are
/// taken relative to the executable.
pub fn resolve(configured: &str, fallback: PathBuf) -> PathBuf {
    if configured.is_empty() {
        return fallback;
    }
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        exe_directory().join(path)
    }
}
