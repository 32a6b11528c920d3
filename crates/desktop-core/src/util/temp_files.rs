//! Managed storage for captured screenshots
//!
//! Every screenshot is written to `$TMP/desktop-control-mcp/` (or a
//! configured directory) so clients receive a file path next to the inline
//! image. Files are tracked and removed when the last manager handle drops;
//! past the file limit the oldest screenshot is deleted on each write.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    config::DEFAULT_MAX_SCREENSHOTS, error::DesktopResult, model::ImageFormat,
    util::downloads::screenshot_filename,
};

/// Directory name under the system temp dir
pub const TEMP_DIR_NAME: &str = "desktop-control-mcp";

/// A screenshot file owned by the manager
#[derive(Debug, Clone)]
pub struct TempFile {
    pub path:      PathBuf,
    pub timestamp: DateTime<Utc>,
}

/// Thread-safe tracker for screenshot files
///
/// Clones share the same list. Cleanup runs when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct TempFileManager {
    dir:   PathBuf,
    limit: usize,
    files: Arc<Mutex<Vec<TempFile>>>,
}

impl TempFileManager {
    /// Manager writing into `$TMP/desktop-control-mcp/`
    pub fn new() -> Self {
        Self::with_dir(std::env::temp_dir().join(TEMP_DIR_NAME))
    }

    /// Manager writing into an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:   dir.into(),
            limit: DEFAULT_MAX_SCREENSHOTS,
            files: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Keeps at most `limit` files (at least one)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes encoded image bytes to a new tracked file
    ///
    /// Returns the path and the number of bytes written.
    ///
    /// ```
    /// use desktop_core::{model::ImageFormat, util::temp_files::TempFileManager};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let manager = TempFileManager::with_dir(dir.path());
    /// let (path, size) = manager.write_image(&[1, 2, 3], ImageFormat::Png).unwrap();
    /// assert_eq!(size, 3);
    /// assert!(path.extension().is_some_and(|e| e == "png"));
    /// ```
    pub fn write_image(&self, data: &[u8], format: ImageFormat) -> DesktopResult<(PathBuf, u64)> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = Utc::now();
        let path = self.dir.join(screenshot_filename(timestamp, format));
        fs::write(&path, data)?;

        let pruned = {
            let mut files = self.files.lock();
            files.push(TempFile {
                path: path.clone(),
                timestamp,
            });
            let excess = files.len().saturating_sub(self.limit);
            files.drain(..excess).collect::<Vec<_>>()
        };
        for old in pruned {
            remove_file(&old.path);
        }
        tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());

        Ok((path, data.len() as u64))
    }

    /// Deletes every tracked file and forgets them
    pub fn cleanup_all(&self) {
        let mut files = self.files.lock();
        for temp_file in files.drain(..) {
            remove_file(&temp_file.path);
        }
    }

    pub fn count(&self) -> usize {
        self.files.lock().len()
    }

    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.lock().iter().map(|f| f.path.clone()).collect()
    }
}

fn remove_file(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to remove temp file {:?}: {}", path, e);
        }
    }
}

impl Default for TempFileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        if Arc::strong_count(&self.files) == 1 {
            self.cleanup_all();
        }
    }
}
