//! Screen capture and window enumeration through xcap
//!
//! xcap calls are synchronous and can stall on a busy display server, so
//! every call runs in `spawn_blocking` under a timeout.

use std::time::Duration;

use async_trait::async_trait;

use super::{ImageBuffer, RegionCapture, ScreenCapture, WindowManager, activation};
use crate::{
    error::{DesktopError, DesktopResult},
    model::{Region, WindowHandle, WindowInfo},
};

/// Timeout for window enumeration
const LIST_WINDOWS_TIMEOUT_MS: u64 = 1500;

/// Timeout for a screen or region capture
///
/// Large 4K/8K displays and remote X servers can take a few seconds.
const CAPTURE_TIMEOUT_MS: u64 = 5000;

const ACTIVATE_TIMEOUT_MS: u64 = 2000;

/// Native capture and window backend
#[derive(Debug, Default, Clone)]
pub struct XcapBackend;

impl XcapBackend {
    pub fn new() -> Self {
        Self
    }

    /// Runs a blocking closure on the blocking pool with a timeout
    ///
    /// ```rust,ignore
    /// let windows = Self::with_timeout(LIST_WINDOWS_TIMEOUT_MS, || xcap::Window::all()...).await?;
    /// ```
    async fn with_timeout<T, F>(timeout_ms: u64, f: F) -> DesktopResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DesktopResult<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(f);
        tokio::time::timeout(Duration::from_millis(timeout_ms), task)
            .await
            .map_err(|_| {
                tracing::warn!("Desktop operation timed out after {}ms", timeout_ms);
                DesktopError::Timeout {
                    duration_ms: timeout_ms,
                }
            })?
            .map_err(|e| {
                tracing::error!("Capture task panicked: {}", e);
                DesktopError::CaptureFailed {
                    reason: e.to_string(),
                }
            })?
    }
}

fn map_xcap_error(context: &str, e: xcap::XCapError) -> DesktopError {
    tracing::error!("xcap {} failed: {}", context, e);
    DesktopError::CaptureFailed {
        reason: format!("{}: {}", context, e),
    }
}

fn window_info(window: &xcap::Window) -> Option<WindowInfo> {
    let title = window.title().ok().filter(|t| !t.trim().is_empty())?;
    let id = window.id().ok()?;

    let is_minimized = window.is_minimized().unwrap_or(false);
    Some(WindowInfo {
        id: id.to_string(),
        title,
        app_name: window.app_name().unwrap_or_default(),
        pid: window.pid().unwrap_or_default(),
        left: window.x().unwrap_or_default(),
        top: window.y().unwrap_or_default(),
        width: window.width().unwrap_or_default(),
        height: window.height().unwrap_or_default(),
        is_active: window.is_focused().unwrap_or(false),
        is_visible: !is_minimized,
        is_minimized,
        is_maximized: window.is_maximized().unwrap_or(false),
    })
}

fn primary_monitor() -> DesktopResult<xcap::Monitor> {
    let monitors = xcap::Monitor::all().map_err(|e| map_xcap_error("monitor enumeration", e))?;
    let primary = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);

    monitors
        .into_iter()
        .nth(primary)
        .ok_or_else(|| DesktopError::CaptureFailed {
            reason: "no monitors found".to_string(),
        })
}

fn monitor_region(monitor: &xcap::Monitor) -> DesktopResult<Region> {
    Ok(Region::new(
        monitor.x().map_err(|e| map_xcap_error("monitor geometry", e))?,
        monitor.y().map_err(|e| map_xcap_error("monitor geometry", e))?,
        monitor.width().map_err(|e| map_xcap_error("monitor geometry", e))?,
        monitor.height().map_err(|e| map_xcap_error("monitor geometry", e))?,
    ))
}

#[async_trait]
impl ScreenCapture for XcapBackend {
    async fn capture_screen(&self) -> DesktopResult<ImageBuffer> {
        Self::with_timeout(CAPTURE_TIMEOUT_MS, || {
            let monitor = primary_monitor()?;
            let image = monitor
                .capture_image()
                .map_err(|e| map_xcap_error("screen capture", e))?;
            tracing::info!("Captured primary display: {}x{}", image.width(), image.height());
            Ok(ImageBuffer::from_rgba(image))
        })
        .await
    }

    async fn capture_region(&self, region: Region) -> DesktopResult<RegionCapture> {
        Self::with_timeout(CAPTURE_TIMEOUT_MS, move || {
            let monitor = match xcap::Monitor::from_point(region.x, region.y) {
                Ok(monitor) => monitor,
                Err(_) => primary_monitor()?,
            };
            let bounds = monitor_region(&monitor)?;
            let visible = bounds.intersect(&region).ok_or_else(|| DesktopError::CaptureFailed {
                reason: format!(
                    "region {}x{} at ({}, {}) is outside the display",
                    region.width, region.height, region.x, region.y
                ),
            })?;

            let image = monitor
                .capture_region(
                    (visible.x - bounds.x) as u32,
                    (visible.y - bounds.y) as u32,
                    visible.width,
                    visible.height,
                )
                .map_err(|e| map_xcap_error("region capture", e))?;
            tracing::info!(
                "Captured region {}x{} at ({}, {})",
                visible.width,
                visible.height,
                visible.x,
                visible.y
            );
            Ok(RegionCapture {
                image: ImageBuffer::from_rgba(image),
                visible,
            })
        })
        .await
    }
}

#[async_trait]
impl WindowManager for XcapBackend {
    async fn list_windows(&self) -> DesktopResult<Vec<WindowInfo>> {
        Self::with_timeout(LIST_WINDOWS_TIMEOUT_MS, || {
            let windows = xcap::Window::all().map_err(|e| map_xcap_error("window enumeration", e))?;
            let infos: Vec<WindowInfo> = windows.iter().filter_map(window_info).collect();
            tracing::debug!("Enumerated {} titled windows", infos.len());
            Ok(infos)
        })
        .await
    }

    async fn activate(&self, id: &WindowHandle) -> DesktopResult<()> {
        let native_id = id.parse::<u32>().map_err(|_| {
            DesktopError::invalid("window_id", format!("expected a numeric window id, got '{}'", id))
        })?;
        Self::with_timeout(ACTIVATE_TIMEOUT_MS, move || activation::activate_window(native_id)).await
    }
}
