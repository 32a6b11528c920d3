//! Mock desktop backend for testing
//!
//! `MockBackend` implements every capability trait in memory: three fixed
//! windows, a 1920x1080 synthetic screen, a pointer position, and a journal
//! of every call. Tests assert on the journal to check ordering (activate
//! before capture, release after drag, ...).
//!
//! # Examples
//!
//! ```
//! use desktop_core::capture::{MockBackend, WindowManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockBackend::new();
//!     let windows = backend.list_windows().await.unwrap();
//!     assert_eq!(windows.len(), 3);
//! }
//! ```
//!
//! ## With Error Injection
//!
//! ```
//! use desktop_core::{
//!     capture::{MockBackend, ScreenCapture},
//!     error::DesktopError,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockBackend::new().with_error(DesktopError::CaptureFailed {
//!         reason: "display gone".to_string(),
//!     });
//!     assert!(backend.capture_screen().await.is_err());
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::sleep;

use super::{ImageBuffer, InputController, RegionCapture, ScreenCapture, WindowManager};
use crate::{
    error::{DesktopError, DesktopResult},
    keys::Key,
    model::{
        MouseButton, Point, PressAction, Region, ScreenSize, TextBox, WindowHandle, WindowInfo,
    },
    ocr::TextRecognizer,
};

/// One call observed by the mock, in order
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    MoveMouse(Point),
    Button(MouseButton, PressAction),
    TypeText(String),
    Key(Key, PressAction),
    Activate(WindowHandle),
    CaptureScreen,
    CaptureRegion(Region),
    /// OCR ran on an image of this size
    Recognize { width: u32, height: u32 },
}

impl MockEvent {
    /// True for synthetic mouse and keyboard events
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            MockEvent::MoveMouse(_) | MockEvent::Button(..) | MockEvent::TypeText(_) | MockEvent::Key(..)
        )
    }
}

#[derive(Debug)]
struct MockState {
    windows:          Vec<WindowInfo>,
    cursor:           Point,
    events:           Vec<MockEvent>,
    moves_until_fail: Option<usize>,
}

/// In-memory desktop used by unit and integration tests
#[derive(Debug)]
pub struct MockBackend {
    delay:           Option<Duration>,
    error_injection: Option<DesktopError>,
    screen:          ScreenSize,
    text_boxes:      Vec<TextBox>,
    state:           Mutex<MockState>,
}

impl MockBackend {
    /// Mock with three windows; "Mozilla Firefox" starts focused
    pub fn new() -> Self {
        Self {
            delay:           None,
            error_injection: None,
            screen:          ScreenSize::new(1920, 1080),
            text_boxes:      Self::default_text_boxes(),
            state:           Mutex::new(MockState {
                windows:          Self::create_mock_windows(),
                cursor:           Point::new(960, 540),
                events:           Vec::new(),
                moves_until_fail: None,
            }),
        }
    }

    /// Sleeps this long before every operation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every operation fails with a copy of `error`
    pub fn with_error(mut self, error: DesktopError) -> Self {
        self.error_injection = Some(error);
        self
    }

    pub fn with_windows(self, windows: Vec<WindowInfo>) -> Self {
        self.state.lock().windows = windows;
        self
    }

    pub fn with_cursor(self, cursor: Point) -> Self {
        self.state.lock().cursor = cursor;
        self
    }

    /// Boxes returned by OCR, in image coordinates
    pub fn with_text_boxes(mut self, text_boxes: Vec<TextBox>) -> Self {
        self.text_boxes = text_boxes;
        self
    }

    /// Lets `count` pointer moves succeed, then fails every later one
    pub fn with_failing_moves_after(self, count: usize) -> Self {
        self.state.lock().moves_until_fail = Some(count);
        self
    }

    fn create_mock_windows() -> Vec<WindowInfo> {
        let mut firefox = WindowInfo::new("mock-0x1", "Mozilla Firefox", Region::new(0, 0, 1280, 800));
        firefox.app_name = "firefox".to_string();
        firefox.pid = 1000;
        firefox.is_active = true;

        let mut code =
            WindowInfo::new("mock-0x2", "Visual Studio Code", Region::new(200, 100, 1400, 900));
        code.app_name = "code".to_string();
        code.pid = 2000;
        code.is_maximized = true;

        let mut terminal =
            WindowInfo::new("mock-0x3", "Terminal - Alacritty", Region::new(1000, 500, 800, 480));
        terminal.app_name = "alacritty".to_string();
        terminal.pid = 3000;

        vec![firefox, code, terminal]
    }

    fn default_text_boxes() -> Vec<TextBox> {
        vec![
            TextBox::from_rect(70.0, 10.0, 120.0, 30.0, "Edit".to_string(), 0.97),
            TextBox::from_rect(10.0, 10.0, 60.0, 30.0, "File".to_string(), 0.99),
        ]
    }

    /// Every recorded call, oldest first
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    /// Only the synthetic input events
    pub fn input_events(&self) -> Vec<MockEvent> {
        self.events().into_iter().filter(MockEvent::is_input).collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// Id of the window that currently has focus
    pub fn active_window_id(&self) -> Option<WindowHandle> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|w| w.is_active)
            .map(|w| w.id.clone())
    }

    async fn apply_delay(&self) {
        if let Some(duration) = self.delay {
            sleep(duration).await;
        }
    }

    /// Replays the injected error; `DesktopError` is not `Clone`
    fn check_error_injection(&self) -> DesktopResult<()> {
        let Some(ref error) = self.error_injection else {
            return Ok(());
        };

        Err(match error {
            DesktopError::WindowNotFound { selector } => DesktopError::WindowNotFound {
                selector: selector.clone(),
            },
            DesktopError::InvalidParameter { parameter, reason } => DesktopError::InvalidParameter {
                parameter: parameter.clone(),
                reason:    reason.clone(),
            },
            DesktopError::UnknownKey { key } => DesktopError::UnknownKey { key: key.clone() },
            DesktopError::InputFailed { action, reason } => DesktopError::InputFailed {
                action: action.clone(),
                reason: reason.clone(),
            },
            DesktopError::CaptureFailed { reason } => DesktopError::CaptureFailed {
                reason: reason.clone(),
            },
            DesktopError::Timeout { duration_ms } => DesktopError::Timeout {
                duration_ms: *duration_ms,
            },
            DesktopError::WindowActivationFailed { title, reason } => {
                DesktopError::WindowActivationFailed {
                    title:  title.clone(),
                    reason: reason.clone(),
                }
            }
            DesktopError::OcrUnavailable { reason } => DesktopError::OcrUnavailable {
                reason: reason.clone(),
            },
            DesktopError::OcrFailed { reason } => DesktopError::OcrFailed {
                reason: reason.clone(),
            },
            DesktopError::EncodingFailed { format, reason } => DesktopError::EncodingFailed {
                format: format.clone(),
                reason: reason.clone(),
            },
            DesktopError::FailSafeTriggered { x, y } => DesktopError::FailSafeTriggered { x: *x, y: *y },
            DesktopError::BackendNotAvailable { backend } => {
                DesktopError::BackendNotAvailable { backend: *backend }
            }
            DesktopError::NotSupported { feature, backend } => DesktopError::NotSupported {
                feature: feature.clone(),
                backend: *backend,
            },
            DesktopError::IoError(e) => DesktopError::IoError(std::io::Error::new(e.kind(), e.to_string())),
            DesktopError::ImageError(msg) => DesktopError::ImageError(msg.clone()),
        })
    }

    async fn begin(&self) -> DesktopResult<()> {
        self.apply_delay().await;
        self.check_error_injection()
    }

    fn record(&self, event: MockEvent) {
        self.state.lock().events.push(event);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputController for MockBackend {
    async fn move_mouse(&self, to: Point) -> DesktopResult<()> {
        self.begin().await?;

        let mut state = self.state.lock();
        if let Some(remaining) = state.moves_until_fail.as_mut() {
            if *remaining == 0 {
                return Err(DesktopError::input("move_mouse", "mock pointer is stuck"));
            }
            *remaining -= 1;
        }
        state.cursor = to;
        state.events.push(MockEvent::MoveMouse(to));
        Ok(())
    }

    async fn mouse_button(&self, button: MouseButton, action: PressAction) -> DesktopResult<()> {
        self.begin().await?;
        self.record(MockEvent::Button(button, action));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DesktopResult<()> {
        self.begin().await?;
        self.record(MockEvent::TypeText(text.to_string()));
        Ok(())
    }

    async fn key(&self, key: Key, action: PressAction) -> DesktopResult<()> {
        self.begin().await?;
        self.record(MockEvent::Key(key, action));
        Ok(())
    }

    async fn cursor_position(&self) -> DesktopResult<Point> {
        self.begin().await?;
        Ok(self.state.lock().cursor)
    }

    async fn screen_size(&self) -> DesktopResult<ScreenSize> {
        self.begin().await?;
        Ok(self.screen)
    }
}

#[async_trait]
impl ScreenCapture for MockBackend {
    async fn capture_screen(&self) -> DesktopResult<ImageBuffer> {
        self.begin().await?;
        self.record(MockEvent::CaptureScreen);
        Ok(ImageBuffer::from_test_pattern(self.screen.width, self.screen.height))
    }

    async fn capture_region(&self, region: Region) -> DesktopResult<RegionCapture> {
        self.begin().await?;
        self.record(MockEvent::CaptureRegion(region));

        let screen = Region::new(0, 0, self.screen.width, self.screen.height);
        let visible = screen.intersect(&region).ok_or_else(|| DesktopError::CaptureFailed {
            reason: format!("region {:?} is off screen", region),
        })?;
        Ok(RegionCapture {
            image: ImageBuffer::from_test_pattern(visible.width, visible.height),
            visible,
        })
    }
}

#[async_trait]
impl WindowManager for MockBackend {
    async fn list_windows(&self) -> DesktopResult<Vec<WindowInfo>> {
        self.begin().await?;
        Ok(self.state.lock().windows.clone())
    }

    async fn activate(&self, id: &WindowHandle) -> DesktopResult<()> {
        self.begin().await?;

        let mut state = self.state.lock();
        if !state.windows.iter().any(|w| &w.id == id) {
            return Err(DesktopError::WindowActivationFailed {
                title:  id.clone(),
                reason: "window no longer exists".to_string(),
            });
        }
        for window in state.windows.iter_mut() {
            window.is_active = &window.id == id;
        }
        state.events.push(MockEvent::Activate(id.clone()));
        Ok(())
    }
}

#[async_trait]
impl TextRecognizer for MockBackend {
    async fn recognize(&self, image: &ImageBuffer) -> DesktopResult<Vec<TextBox>> {
        self.begin().await?;
        self.record(MockEvent::Recognize {
            width:  image.width(),
            height: image.height(),
        });
        Ok(self.text_boxes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_windows() {
        let backend = MockBackend::new();
        let windows = backend.list_windows().await.unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].title, "Mozilla Firefox");
        assert!(windows[0].is_active);
        assert_eq!(backend.active_window().await.unwrap().unwrap().id, "mock-0x1");
    }

    #[tokio::test]
    async fn test_activate_moves_focus() {
        let backend = MockBackend::new();
        backend.activate(&"mock-0x3".to_string()).await.unwrap();

        assert_eq!(backend.active_window_id().as_deref(), Some("mock-0x3"));
        assert_eq!(backend.events(), vec![MockEvent::Activate("mock-0x3".to_string())]);
    }

    #[tokio::test]
    async fn test_activate_unknown_window() {
        let backend = MockBackend::new();
        let result = backend.activate(&"nope".to_string()).await;
        assert!(matches!(result, Err(DesktopError::WindowActivationFailed { .. })));
    }

    #[tokio::test]
    async fn test_capture_region_clips_to_screen() {
        let backend = MockBackend::new();
        let capture = backend
            .capture_region(Region::new(1800, 1000, 400, 300))
            .await
            .unwrap();
        assert_eq!(capture.image.dimensions(), (120, 80));
        assert_eq!(capture.visible, Region::new(1800, 1000, 120, 80));

        let left = backend.capture_region(Region::new(-100, 50, 300, 200)).await.unwrap();
        assert_eq!(left.visible, Region::new(0, 50, 200, 200));

        let off = backend.capture_region(Region::new(5000, 0, 10, 10)).await;
        assert!(matches!(off, Err(DesktopError::CaptureFailed { .. })));
    }

    #[tokio::test]
    async fn test_input_is_recorded() {
        let backend = MockBackend::new();
        backend.move_mouse(Point::new(5, 6)).await.unwrap();
        backend.click(MouseButton::Right, 2).await.unwrap();
        backend.type_text("hi").await.unwrap();

        assert_eq!(
            backend.input_events(),
            vec![
                MockEvent::MoveMouse(Point::new(5, 6)),
                MockEvent::Button(MouseButton::Right, PressAction::Click),
                MockEvent::Button(MouseButton::Right, PressAction::Click),
                MockEvent::TypeText("hi".to_string()),
            ]
        );
        assert_eq!(backend.cursor_position().await.unwrap(), Point::new(5, 6));
    }

    #[tokio::test]
    async fn test_failing_moves() {
        let backend = MockBackend::new().with_failing_moves_after(1);
        assert!(backend.move_mouse(Point::new(1, 1)).await.is_ok());
        assert!(backend.move_mouse(Point::new(2, 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_error_injection_applies_everywhere() {
        let backend = MockBackend::new().with_error(DesktopError::Timeout { duration_ms: 5 });

        assert!(matches!(backend.list_windows().await, Err(DesktopError::Timeout { duration_ms: 5 })));
        assert!(backend.screen_size().await.is_err());
        assert!(backend.recognize(&ImageBuffer::from_test_pattern(2, 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_delay() {
        let backend = MockBackend::new().with_delay(Duration::from_millis(30));
        let start = std::time::Instant::now();
        backend.screen_size().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_recognize_records_image_size() {
        let backend = MockBackend::new();
        let boxes = backend
            .recognize(&ImageBuffer::from_test_pattern(320, 200))
            .await
            .unwrap();

        assert_eq!(boxes.len(), 2);
        assert_eq!(backend.events(), vec![MockEvent::Recognize { width: 320, height: 200 }]);
    }
}
