//! Artifact persistence.
//!
//! Composites land in the shared screenshots collection under a
//! timestamped name. Writes are two-phase: bytes go to a hidden pending
//! name first and only an atomic rename makes the file visible, so other
//! consumers never observe a partially written artifact.

use crate::{Error, Result};
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Timestamped artifact filename, `DualShot_<yyyyMMdd_HHmmss>.png`.
#[must_use]
pub fn shot_filename(at: DateTime<Local>) -> String {
    at.format("DualShot_%Y%m%d_%H%M%S.png").to_string()
}

/// Default artifact directory: the platform pictures collection under
/// `Screenshots/`.
#[must_use]
pub fn default_screenshots_dir() -> Option<PathBuf> {
    dirs::picture_dir().map(|pictures| pictures.join("Screenshots"))
}

/// Persist a composite under `dir/filename` with the pending/visible
/// two-phase write.
///
/// # Errors
///
/// Returns `Error::Persist` if the directory cannot be created, encoding
/// fails, or the rename fails. The pending file is removed on failure so
/// no partial artifact is left behind.
pub fn persist_composite(image: &RgbaImage, dir: &Path, filename: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Persist(format!("cannot create {}: {e}", dir.display())))?;

    let pending = dir.join(format!(".{filename}.pending"));
    let visible = dir.join(filename);

    if let Err(e) = image.save_with_format(&pending, image::ImageFormat::Png) {
        let _ = std::fs::remove_file(&pending);
        return Err(Error::Persist(format!(
            "cannot write {}: {e}",
            pending.display()
        )));
    }

    if let Err(e) = std::fs::rename(&pending, &visible) {
        let _ = std::fs::remove_file(&pending);
        return Err(Error::Persist(format!(
            "cannot publish {}: {e}",
            visible.display()
        )));
    }

    Ok(visible)
}
