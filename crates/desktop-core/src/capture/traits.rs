//! Capability traits for desktop backends
//!
//! Each trait covers one concern so a backend can be assembled from
//! independent parts (enigo input, xcap capture, EWMH activation) and tests
//! can swap any of them for the mock.
//!
//! - [`InputController`]: synthetic mouse and keyboard input
//! - [`ScreenCapture`]: full-screen and region screenshots
//! - [`WindowManager`]: window enumeration and activation

use async_trait::async_trait;

use super::ImageBuffer;
use crate::{
    error::DesktopResult,
    keys::Key,
    model::{MouseButton, Point, PressAction, Region, ScreenSize, WindowHandle, WindowInfo},
};

/// Capability: inject mouse and keyboard events.
#[async_trait]
pub trait InputController: Send + Sync {
    /// Moves the pointer to absolute screen coordinates.
    async fn move_mouse(&self, to: Point) -> DesktopResult<()>;

    /// Presses, releases, or clicks a button at the current pointer position.
    async fn mouse_button(&self, button: MouseButton, action: PressAction) -> DesktopResult<()>;

    /// Clicks `count` times in quick succession (2 = double click).
    async fn click(&self, button: MouseButton, count: u32) -> DesktopResult<()> {
        for _ in 0..count {
            self.mouse_button(button, PressAction::Click).await?;
        }
        Ok(())
    }

    /// Types a string as keyboard input.
    async fn type_text(&self, text: &str) -> DesktopResult<()>;

    /// Presses, releases, or taps a single key.
    async fn key(&self, key: Key, action: PressAction) -> DesktopResult<()>;

    /// Presses `keys` in order, then releases them in reverse order.
    ///
    /// Keys already held are released even when a later press fails.
    /// Backends whose key state does not outlive a single call must
    /// override this to issue the whole chord at once.
    async fn key_chord(&self, keys: &[Key]) -> DesktopResult<()> {
        let mut held = Vec::with_capacity(keys.len());
        let mut result = Ok(());
        for key in keys {
            if let Err(e) = self.key(*key, PressAction::Press).await {
                result = Err(e);
                break;
            }
            held.push(*key);
        }

        for key in held.into_iter().rev() {
            if let Err(e) = self.key(key, PressAction::Release).await {
                tracing::warn!("Failed to release {}: {}", key, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Current pointer position.
    async fn cursor_position(&self) -> DesktopResult<Point>;

    /// Size of the primary display.
    async fn screen_size(&self) -> DesktopResult<ScreenSize>;
}

/// Capability: read pixels from the screen.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Captures the whole primary display.
    async fn capture_screen(&self) -> DesktopResult<ImageBuffer>;

    /// Captures a rectangle given in absolute screen coordinates.
    ///
    /// Parts of the region outside the display are clipped; the returned
    /// [`RegionCapture::visible`] is the area actually captured.
    async fn capture_region(&self, region: Region) -> DesktopResult<RegionCapture>;
}

/// Pixels of a region capture and the screen area they cover
#[derive(Debug, Clone)]
pub struct RegionCapture {
    pub image:   ImageBuffer,
    pub visible: Region,
}

/// Capability: enumerate and focus top-level windows.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Lists windows that have a non-empty title, in stacking order.
    async fn list_windows(&self) -> DesktopResult<Vec<WindowInfo>>;

    /// The window that currently has input focus, if any.
    async fn active_window(&self) -> DesktopResult<Option<WindowInfo>> {
        Ok(self.list_windows().await?.into_iter().find(|w| w.is_active))
    }

    /// Brings a window to the foreground and gives it focus.
    async fn activate(&self, id: &WindowHandle) -> DesktopResult<()>;
}
