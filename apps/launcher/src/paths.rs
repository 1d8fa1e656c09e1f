use std::path::{Path, PathBuf};

use eframe::egui;

pub const ICON_RELATIVE_PATH: &str = "assets/launcher-icon.png";
pub const DASHBOARD_BIN_NAME: &str = "dashboard";

pub fn sibling_executable(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}

/// An explicit path wins; otherwise the dashboard must sit next to the
/// launcher executable.
pub fn resolve_dashboard_bin(explicit: Option<PathBuf>, exe_dir: Option<&Path>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let candidate = sibling_executable(exe_dir?, DASHBOARD_BIN_NAME);
    candidate.is_file().then_some(candidate)
}

pub fn resolve_icon(
    explicit: Option<PathBuf>,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    [exe_dir, cwd]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(ICON_RELATIVE_PATH))
        .find(|path| path.is_file())
}

pub fn load_icon(path: &Path) -> Result<egui::IconData, image::ImageError> {
    let rgba = image::open(path)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(egui::IconData {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}
