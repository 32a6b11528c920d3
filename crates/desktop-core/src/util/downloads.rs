//! Screenshot file naming and the downloads directory

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, TimeZone};

use crate::{
    error::{DesktopError, DesktopResult},
    model::ImageFormat,
};

/// Builds `screenshot_<YYYYmmdd_HHMMSS>_<8 hex>.<ext>` in local time
///
/// ```
/// use chrono::{Local, TimeZone};
/// use desktop_core::{model::ImageFormat, util::downloads::screenshot_filename};
///
/// let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// let name = screenshot_filename(ts, ImageFormat::Png);
/// assert!(name.starts_with("screenshot_20240309_140507_"));
/// assert!(name.ends_with(".png"));
/// ```
pub fn screenshot_filename<Tz: TimeZone>(timestamp: DateTime<Tz>, format: ImageFormat) -> String {
    let local = timestamp.with_timezone(&Local);
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "screenshot_{}_{}.{}",
        local.format("%Y%m%d_%H%M%S"),
        &unique[..8],
        format.extension()
    )
}

/// Resolves the downloads directory, honouring an explicit override
///
/// Falls back to `~/Downloads` when the platform reports no downloads folder.
pub fn downloads_dir(override_dir: Option<&Path>) -> DesktopResult<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .ok_or_else(|| DesktopError::invalid("save_to_downloads", "no downloads directory found"))
}

/// Copies a screenshot into `dir`, keeping its file name
pub fn copy_to_dir(source: &Path, dir: &Path) -> DesktopResult<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| DesktopError::invalid("path", format!("{} has no file name", source.display())))?;

    fs::create_dir_all(dir)?;
    let target = dir.join(name);
    fs::copy(source, &target)?;
    tracing::info!("Saved screenshot to {}", target.display());

    Ok(target)
}
