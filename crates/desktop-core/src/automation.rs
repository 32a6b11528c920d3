//! Desktop operations behind the MCP tools
//!
//! [`DesktopController`] turns one tool call into a short sequence of
//! backend calls: validate arguments, check the fail-safe, drive the input
//! or capture backend, and shape the result. It owns no platform code, so
//! the same controller runs against native backends and [`MockBackend`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use desktop_core::{
//!     automation::{DesktopController, ScreenshotRequest},
//!     capture::{MockBackend, composite_from_mock},
//!     config::DesktopConfig,
//!     model::Point,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(composite_from_mock(Arc::new(MockBackend::new())));
//!     let controller = DesktopController::new(backend, DesktopConfig::immediate());
//!
//!     let message = controller.move_mouse(Point::new(10, 20)).await.unwrap();
//!     assert_eq!(message, "Successfully moved mouse to coordinates (10, 20)");
//!
//!     let shot = controller.take_screenshot(ScreenshotRequest::default()).await.unwrap();
//!     assert_eq!((shot.width, shot.height), (1920, 1080));
//! }
//! ```
//!
//! [`MockBackend`]: crate::capture::MockBackend

use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{
    capture::{DesktopBackend, ImageBuffer, WindowMatcher},
    config::DesktopConfig,
    error::{DesktopError, DesktopResult},
    keys::KeyChord,
    model::{
        HealthCheckResponse, ImageFormat, MouseButton, Point, PressAction, ScreenSize, TextBox,
        WindowInfo, WindowSelector,
    },
    util::{
        downloads::{copy_to_dir, downloads_dir},
        encode::encode_image,
        temp_files::TempFileManager,
    },
};

/// Default drag duration in seconds
pub const DEFAULT_DRAG_SECONDS: f64 = 0.5;

/// Longest accepted drag
pub const MAX_DRAG_SECONDS: f64 = 60.0;

/// Most clicks accepted in one `click` call (triple click)
pub const MAX_CLICKS: u32 = 3;

/// What `take_screenshot` should capture and return
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotRequest {
    /// Window to capture; no pattern or no match captures the whole screen
    pub selector:          WindowSelector,
    /// Run OCR on the capture
    pub with_ocr:          bool,
    /// Downscale applied before OCR, 1..=100
    pub scale_percent:     u8,
    /// Also copy the file to the downloads directory
    pub save_to_downloads: bool,
    pub format:            ImageFormat,
}

impl Default for ScreenshotRequest {
    fn default() -> Self {
        Self {
            selector:          WindowSelector::default(),
            with_ocr:          false,
            scale_percent:     100,
            save_to_downloads: false,
            format:            ImageFormat::default(),
        }
    }
}

impl ScreenshotRequest {
    pub fn for_window(selector: WindowSelector) -> Self {
        Self {
            selector,
            ..Default::default()
        }
    }

    /// Enables OCR with the given pre-OCR downscale
    pub fn with_ocr(mut self, scale_percent: u8) -> Self {
        self.with_ocr = true;
        self.scale_percent = scale_percent;
        self
    }
}

/// A captured, encoded and stored screenshot
#[derive(Debug, Clone)]
pub struct ScreenshotOutcome {
    /// Encoded image bytes
    pub data:       Vec<u8>,
    pub format:     ImageFormat,
    /// Managed temp file holding `data`
    pub path:       PathBuf,
    pub size_bytes: u64,
    pub width:      u32,
    pub height:     u32,
    /// The captured window, `None` for a full-screen capture
    pub window:     Option<WindowInfo>,
    /// Copy in the downloads directory
    pub saved_path: Option<PathBuf>,
    /// Text boxes in absolute screen coordinates
    pub ocr:        Option<Vec<TextBox>>,
}

/// Runs desktop operations against a backend
#[derive(Debug)]
pub struct DesktopController {
    backend:    Arc<DesktopBackend>,
    config:     DesktopConfig,
    matcher:    WindowMatcher,
    temp_files: TempFileManager,
}

impl DesktopController {
    pub fn new(backend: Arc<DesktopBackend>, config: DesktopConfig) -> Self {
        let temp_files = config
            .screenshot_dir
            .clone()
            .map(TempFileManager::with_dir)
            .unwrap_or_default()
            .with_limit(config.max_screenshots);

        Self {
            backend,
            config,
            matcher: WindowMatcher::new(),
            temp_files,
        }
    }

    pub fn backend(&self) -> &Arc<DesktopBackend> {
        &self.backend
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn temp_files(&self) -> &TempFileManager {
        &self.temp_files
    }

    pub fn health(&self) -> HealthCheckResponse {
        HealthCheckResponse::from_platform(self.backend.platform.clone(), self.backend.name)
    }

    /// Refuses input while the pointer is parked in a screen corner
    async fn check_fail_safe(&self) -> DesktopResult<()> {
        if !self.config.fail_safe {
            return Ok(());
        }

        let position = self.backend.input.cursor_position().await?;
        let screen = self.backend.input.screen_size().await?;
        if screen.is_corner(position) {
            tracing::warn!("Fail-safe: pointer at ({}, {}), refusing input", position.x, position.y);
            return Err(DesktopError::FailSafeTriggered {
                x: position.x,
                y: position.y,
            });
        }
        Ok(())
    }

    async fn pause(&self) {
        let pause = self.config.action_pause();
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }

    pub async fn click(&self, at: Point, button: MouseButton, clicks: u32) -> DesktopResult<String> {
        if clicks == 0 || clicks > MAX_CLICKS {
            return Err(DesktopError::invalid(
                "clicks",
                format!("{} is outside 1..={}", clicks, MAX_CLICKS),
            ));
        }
        self.check_fail_safe().await?;

        tracing::info!("Clicking {} x{} at ({}, {})", button, clicks, at.x, at.y);
        self.backend.input.move_mouse(at).await?;
        self.backend.input.click(button, clicks).await?;
        self.pause().await;

        Ok(format!("Successfully clicked at coordinates ({}, {})", at.x, at.y))
    }

    pub async fn move_mouse(&self, to: Point) -> DesktopResult<String> {
        self.check_fail_safe().await?;

        self.backend.input.move_mouse(to).await?;
        self.pause().await;

        Ok(format!("Successfully moved mouse to coordinates ({}, {})", to.x, to.y))
    }

    /// Drags with the left button from `from` to `to` over `duration_secs`
    ///
    /// The button is released even if an intermediate move fails.
    pub async fn drag_mouse(&self, from: Point, to: Point, duration_secs: f64) -> DesktopResult<String> {
        if !duration_secs.is_finite() || !(0.0..=MAX_DRAG_SECONDS).contains(&duration_secs) {
            return Err(DesktopError::invalid(
                "duration",
                format!("must be between 0 and {} seconds", MAX_DRAG_SECONDS),
            ));
        }
        self.check_fail_safe().await?;

        tracing::info!(
            "Dragging from ({}, {}) to ({}, {}) over {}s",
            from.x,
            from.y,
            to.x,
            to.y,
            duration_secs
        );
        let input = &self.backend.input;
        input.move_mouse(from).await?;
        input.mouse_button(MouseButton::Left, PressAction::Press).await?;

        let moved = self.interpolate(from, to, duration_secs).await;
        let released = input.mouse_button(MouseButton::Left, PressAction::Release).await;
        moved?;
        released?;
        self.pause().await;

        Ok(format!(
            "Successfully dragged from ({}, {}) to ({}, {})",
            from.x, from.y, to.x, to.y
        ))
    }

    fn drag_steps(&self, duration_secs: f64) -> u32 {
        let steps = (duration_secs * self.config.drag_steps_per_second as f64).round() as u32;
        steps.max(1)
    }

    async fn interpolate(&self, from: Point, to: Point, duration_secs: f64) -> DesktopResult<()> {
        let steps = self.drag_steps(duration_secs);
        let interval = Duration::from_secs_f64(duration_secs / steps as f64);
        let dx = f64::from(to.x) - f64::from(from.x);
        let dy = f64::from(to.y) - f64::from(from.y);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            let point = Point::new(lerp(from.x, dx, t), lerp(from.y, dy, t));
            self.backend.input.move_mouse(point).await?;
            if !interval.is_zero() {
                sleep(interval).await;
            }
        }
        Ok(())
    }

    pub async fn type_text(&self, text: &str) -> DesktopResult<String> {
        self.check_fail_safe().await?;

        tracing::info!("Typing {} characters", text.chars().count());
        self.backend.input.type_text(text).await?;
        self.pause().await;

        Ok(format!("Successfully typed text: {}", text))
    }

    /// Presses a key or a `+` chord
    ///
    /// Chord keys are pressed in order and released in reverse order; keys
    /// already held are released even when a later press fails.
    pub async fn press_key(&self, spec: &str) -> DesktopResult<String> {
        let chord: KeyChord = spec.parse()?;
        self.check_fail_safe().await?;

        tracing::info!("Pressing {}", chord);
        if let [key] = chord.keys() {
            self.backend.input.key(*key, PressAction::Click).await?;
        } else {
            self.backend.input.key_chord(chord.keys()).await?;
        }
        self.pause().await;

        Ok(format!("Successfully pressed key: {}", spec))
    }

    pub async fn screen_size(&self) -> DesktopResult<ScreenSize> {
        self.backend.input.screen_size().await
    }

    pub async fn list_windows(&self) -> DesktopResult<Vec<WindowInfo>> {
        let windows = self.backend.windows.list_windows().await?;
        tracing::debug!("Listing {} windows", windows.len());
        Ok(windows)
    }

    /// Focuses the window matching `selector` and returns it
    pub async fn activate_window(&self, selector: &WindowSelector) -> DesktopResult<WindowInfo> {
        if selector.pattern().is_none() {
            return Err(DesktopError::invalid("title_pattern", "must not be empty"));
        }

        let windows = self.backend.windows.list_windows().await?;
        let window = self
            .matcher
            .find_match(selector, &windows)?
            .cloned()
            .ok_or_else(|| DesktopError::WindowNotFound {
                selector: selector.clone(),
            })?;

        tracing::info!("Activating window '{}' ({})", window.title, window.id);
        self.backend.windows.activate(&window.id).await?;
        Ok(window)
    }

    /// Captures a window or the full screen, stores it and optionally runs OCR
    pub async fn take_screenshot(&self, request: ScreenshotRequest) -> DesktopResult<ScreenshotOutcome> {
        if request.with_ocr {
            if request.scale_percent == 0 || request.scale_percent > 100 {
                return Err(DesktopError::invalid(
                    "scale_percent_for_ocr",
                    format!("{} is outside 1..=100", request.scale_percent),
                ));
            }
            self.backend.recognizer()?;
        }

        let windows = self.backend.windows.list_windows().await?;
        let target = self.matcher.find_match(&request.selector, &windows)?.cloned();

        let (image, origin) = match &target {
            Some(window) => self.capture_window(window, &windows).await?,
            None => {
                if let Some(pattern) = request.selector.pattern() {
                    tracing::warn!("No window matches '{}', capturing the full screen", pattern);
                }
                (self.backend.capture.capture_screen().await?, Point::new(0, 0))
            }
        };

        let data = encode_image(&image, request.format)?;
        let (path, size_bytes) = self.temp_files.write_image(&data, request.format)?;

        let saved_path = if request.save_to_downloads {
            let dir = downloads_dir(self.config.downloads_dir.as_deref())?;
            Some(copy_to_dir(&path, &dir)?)
        } else {
            None
        };

        let ocr = if request.with_ocr {
            Some(self.recognize(&image, request.scale_percent, origin).await?)
        } else {
            None
        };

        Ok(ScreenshotOutcome {
            data,
            format: request.format,
            path,
            size_bytes,
            width: image.width(),
            height: image.height(),
            window: target,
            saved_path,
            ocr,
        })
    }

    /// Activates `window`, captures it and gives focus back
    ///
    /// Returns the image and the screen position of its top-left pixel.
    async fn capture_window(
        &self,
        window: &WindowInfo,
        windows: &[WindowInfo],
    ) -> DesktopResult<(ImageBuffer, Point)> {
        let previous = windows.iter().find(|w| w.is_active && w.id != window.id);

        if !window.is_active {
            match self.backend.windows.activate(&window.id).await {
                Ok(()) => sleep(self.config.activation_settle()).await,
                Err(e) => tracing::warn!("Could not activate '{}': {}", window.title, e),
            }
        }

        tracing::info!("Capturing window '{}'", window.title);
        let captured = self.backend.capture.capture_region(window.region()).await;

        if let Some(previous) = previous {
            if let Err(e) = self.backend.windows.activate(&previous.id).await {
                tracing::warn!("Could not restore focus to '{}': {}", previous.title, e);
            }
            sleep(self.config.restore_settle()).await;
        }

        let captured = captured?;
        Ok((captured.image, Point::new(captured.visible.x, captured.visible.y)))
    }

    /// Runs OCR on a downscaled copy and maps boxes back to screen pixels
    async fn recognize(&self, image: &ImageBuffer, scale_percent: u8, origin: Point) -> DesktopResult<Vec<TextBox>> {
        let recognizer = self.backend.recognizer()?;
        let scaled = if scale_percent == 100 {
            image.clone()
        } else {
            image.scale_percent(scale_percent)?
        };

        let boxes = recognizer.recognize(&scaled).await?;
        let factor = image.width() as f32 / scaled.width().max(1) as f32;
        tracing::info!("OCR found {} text boxes", boxes.len());

        Ok(boxes.into_iter().map(|b| b.rescaled(factor, origin)).collect())
    }
}

/// `start + delta * t`, rounded and clamped to the `i32` coordinate range
fn lerp(start: i32, delta: f64, t: f64) -> i32 {
    let value = (f64::from(start) + delta * t).round();
    value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        capture::{MockBackend, MockEvent, composite_from_mock},
        keys::Key,
    };

    fn controller_with(mock: Arc<MockBackend>, config: DesktopConfig) -> (DesktopController, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = DesktopConfig {
            screenshot_dir: Some(dir.path().join("shots")),
            downloads_dir: Some(dir.path().join("downloads")),
            ..config
        };
        let backend = Arc::new(composite_from_mock(mock));
        (DesktopController::new(backend, config), dir)
    }

    fn controller(mock: Arc<MockBackend>) -> (DesktopController, TempDir) {
        controller_with(mock, DesktopConfig::immediate())
    }

    #[tokio::test]
    async fn test_click_moves_then_clicks() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let message = controller
            .click(Point::new(100, 200), MouseButton::Left, 2)
            .await
            .unwrap();

        assert_eq!(message, "Successfully clicked at coordinates (100, 200)");
        assert_eq!(
            mock.input_events(),
            vec![
                MockEvent::MoveMouse(Point::new(100, 200)),
                MockEvent::Button(MouseButton::Left, PressAction::Click),
                MockEvent::Button(MouseButton::Left, PressAction::Click),
            ]
        );
    }

    #[tokio::test]
    async fn test_click_count_validated() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let result = controller.click(Point::new(1, 1), MouseButton::Left, 0).await;
        assert!(matches!(result, Err(DesktopError::InvalidParameter { .. })));
        assert!(mock.input_events().is_empty());
    }

    #[tokio::test]
    async fn test_fail_safe_refuses_input_in_corner() {
        let mock = Arc::new(MockBackend::new().with_cursor(Point::new(0, 0)));
        let config = DesktopConfig {
            fail_safe: true,
            ..DesktopConfig::immediate()
        };
        let (controller, _dir) = controller_with(mock.clone(), config);

        let result = controller.type_text("hello").await;
        assert!(matches!(result, Err(DesktopError::FailSafeTriggered { x: 0, y: 0 })));
        assert!(mock.input_events().is_empty());
    }

    #[tokio::test]
    async fn test_fail_safe_allows_input_elsewhere() {
        let mock = Arc::new(MockBackend::new());
        let config = DesktopConfig {
            fail_safe: true,
            ..DesktopConfig::immediate()
        };
        let (controller, _dir) = controller_with(mock, config);

        let message = controller.type_text("hello").await.unwrap();
        assert_eq!(message, "Successfully typed text: hello");
    }

    #[tokio::test]
    async fn test_fail_safe_ignores_secondary_monitor_edges() {
        let mock = Arc::new(MockBackend::new().with_cursor(Point::new(2500, 0)));
        let config = DesktopConfig {
            fail_safe: true,
            ..DesktopConfig::immediate()
        };
        let (controller, _dir) = controller_with(mock.clone(), config);

        controller.move_mouse(Point::new(10, 10)).await.unwrap();
        assert_eq!(mock.input_events(), vec![MockEvent::MoveMouse(Point::new(10, 10))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_sequence() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let message = controller
            .drag_mouse(Point::new(0, 0), Point::new(100, 50), 0.1)
            .await
            .unwrap();
        assert_eq!(message, "Successfully dragged from (0, 0) to (100, 50)");

        let events = mock.input_events();
        assert_eq!(events.first(), Some(&MockEvent::MoveMouse(Point::new(0, 0))));
        assert_eq!(events[1], MockEvent::Button(MouseButton::Left, PressAction::Press));
        assert_eq!(
            events.last(),
            Some(&MockEvent::Button(MouseButton::Left, PressAction::Release))
        );
        // 0.1s at 60 steps/s
        let moves = events.iter().filter(|e| matches!(e, MockEvent::MoveMouse(_))).count();
        assert_eq!(moves, 1 + 6);
        assert_eq!(events[events.len() - 2], MockEvent::MoveMouse(Point::new(100, 50)));
    }

    #[tokio::test]
    async fn test_zero_duration_drag_takes_one_step() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        controller
            .drag_mouse(Point::new(10, 10), Point::new(20, 20), 0.0)
            .await
            .unwrap();
        assert_eq!(mock.input_events().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_across_full_coordinate_range() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let from = Point::new(i32::MIN, i32::MAX);
        let to = Point::new(i32::MAX, i32::MIN);
        controller.drag_mouse(from, to, 0.05).await.unwrap();

        let moves: Vec<Point> = mock
            .input_events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::MoveMouse(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(moves.first(), Some(&from));
        assert_eq!(moves.last(), Some(&to));
        assert!(moves.windows(2).all(|w| w[0].x <= w[1].x && w[0].y >= w[1].y));
    }

    #[test]
    fn test_lerp_clamps_to_coordinate_range() {
        assert_eq!(lerp(0, 10.0, 0.5), 5);
        assert_eq!(lerp(-3, -4.0, 1.0), -7);
        assert_eq!(lerp(i32::MAX, 10.0, 1.0), i32::MAX);
        assert_eq!(lerp(i32::MIN, -10.0, 1.0), i32::MIN);
    }

    #[tokio::test]
    async fn test_drag_releases_button_when_move_fails() {
        // Only the move to the start point succeeds
        let mock = Arc::new(MockBackend::new().with_failing_moves_after(1));
        let (controller, _dir) = controller(mock.clone());

        let result = controller
            .drag_mouse(Point::new(0, 0), Point::new(300, 300), 0.0)
            .await;

        assert!(matches!(result, Err(DesktopError::InputFailed { .. })));
        assert_eq!(
            mock.input_events(),
            vec![
                MockEvent::MoveMouse(Point::new(0, 0)),
                MockEvent::Button(MouseButton::Left, PressAction::Press),
                MockEvent::Button(MouseButton::Left, PressAction::Release),
            ]
        );
    }

    #[tokio::test]
    async fn test_drag_duration_validated() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        for duration in [-1.0, f64::NAN, f64::INFINITY, 61.0] {
            let result = controller
                .drag_mouse(Point::new(0, 0), Point::new(1, 1), duration)
                .await;
            assert!(matches!(result, Err(DesktopError::InvalidParameter { .. })));
        }
        assert!(mock.input_events().is_empty());
    }

    #[tokio::test]
    async fn test_press_single_key() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let message = controller.press_key("enter").await.unwrap();
        assert_eq!(message, "Successfully pressed key: enter");
        assert_eq!(mock.input_events(), vec![MockEvent::Key(Key::Enter, PressAction::Click)]);
    }

    #[tokio::test]
    async fn test_press_chord_releases_in_reverse() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        controller.press_key("ctrl+shift+t").await.unwrap();
        assert_eq!(
            mock.input_events(),
            vec![
                MockEvent::Key(Key::Control, PressAction::Press),
                MockEvent::Key(Key::Shift, PressAction::Press),
                MockEvent::Key(Key::Char('t'), PressAction::Press),
                MockEvent::Key(Key::Char('t'), PressAction::Release),
                MockEvent::Key(Key::Shift, PressAction::Release),
                MockEvent::Key(Key::Control, PressAction::Release),
            ]
        );
    }

    #[tokio::test]
    async fn test_press_unknown_key() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let result = controller.press_key("ctrl+hyper").await;
        assert!(matches!(result, Err(DesktopError::UnknownKey { .. })));
        assert!(mock.input_events().is_empty());
    }

    #[tokio::test]
    async fn test_activate_window() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let window = controller
            .activate_window(&WindowSelector::by_title("visual studio"))
            .await
            .unwrap();
        assert_eq!(window.id, "mock-0x2");
        assert_eq!(mock.active_window_id().as_deref(), Some("mock-0x2"));
    }

    #[tokio::test]
    async fn test_activate_window_errors() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock);

        let missing = controller
            .activate_window(&WindowSelector::by_title("Photoshop Elements"))
            .await;
        assert!(matches!(missing, Err(DesktopError::WindowNotFound { .. })));

        let blank = controller.activate_window(&WindowSelector::default()).await;
        assert!(matches!(blank, Err(DesktopError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_screenshot_full_screen_fallback() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let shot = controller
            .take_screenshot(ScreenshotRequest::for_window(WindowSelector::by_title("No Such App")))
            .await
            .unwrap();

        assert!(shot.window.is_none());
        assert_eq!((shot.width, shot.height), (1920, 1080));
        assert!(shot.path.exists());
        assert_eq!(shot.size_bytes, shot.data.len() as u64);
        assert!(mock.events().contains(&MockEvent::CaptureScreen));
        assert!(!mock.events().iter().any(|e| matches!(e, MockEvent::Activate(_))));
    }

    #[tokio::test]
    async fn test_screenshot_window_activates_then_restores() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let shot = controller
            .take_screenshot(ScreenshotRequest::for_window(WindowSelector::by_title("Terminal")))
            .await
            .unwrap();

        assert_eq!(shot.window.as_ref().map(|w| w.id.as_str()), Some("mock-0x3"));
        assert_eq!((shot.width, shot.height), (800, 480));
        assert_eq!(
            mock.events(),
            vec![
                MockEvent::Activate("mock-0x3".to_string()),
                MockEvent::CaptureRegion(crate::model::Region::new(1000, 500, 800, 480)),
                MockEvent::Activate("mock-0x1".to_string()),
            ]
        );
        assert_eq!(mock.active_window_id().as_deref(), Some("mock-0x1"));
    }

    #[tokio::test]
    async fn test_screenshot_of_active_window_skips_focus_changes() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        controller
            .take_screenshot(ScreenshotRequest::for_window(WindowSelector::by_title("Firefox")))
            .await
            .unwrap();
        assert!(!mock.events().iter().any(|e| matches!(e, MockEvent::Activate(_))));
    }

    #[tokio::test]
    async fn test_screenshot_ocr_boxes_are_rescaled_and_offset() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let request = ScreenshotRequest::for_window(WindowSelector::by_title("Terminal")).with_ocr(50);
        let shot = controller.take_screenshot(request).await.unwrap();

        assert!(mock.events().contains(&MockEvent::Recognize { width: 400, height: 240 }));
        let boxes = shot.ocr.unwrap();
        let edit = boxes.iter().find(|b| b.text == "Edit").unwrap();
        // (70, 10) in the half-size image is (140, 20) in the window at (1000, 500)
        assert_eq!(edit.origin(), [1140.0, 520.0]);
    }

    #[tokio::test]
    async fn test_screenshot_ocr_scale_validated() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock.clone());

        let result = controller
            .take_screenshot(ScreenshotRequest::default().with_ocr(0))
            .await;
        assert!(matches!(result, Err(DesktopError::InvalidParameter { .. })));
        assert!(mock.events().is_empty());
    }

    #[tokio::test]
    async fn test_screenshot_saved_to_downloads() {
        let mock = Arc::new(MockBackend::new());
        let (controller, dir) = controller(mock);

        let request = ScreenshotRequest {
            save_to_downloads: true,
            format: ImageFormat::Jpeg,
            ..Default::default()
        };
        let shot = controller.take_screenshot(request).await.unwrap();

        let saved = shot.saved_path.unwrap();
        assert!(saved.starts_with(dir.path().join("downloads")));
        assert_eq!(saved.file_name(), shot.path.file_name());
        assert!(saved.extension().is_some_and(|e| e == "jpg"));
        assert!(saved.exists());
    }

    #[tokio::test]
    async fn test_screenshot_files_capped() {
        let mock = Arc::new(MockBackend::new());
        let config = DesktopConfig {
            max_screenshots: 2,
            ..DesktopConfig::immediate()
        };
        let (controller, _dir) = controller_with(mock, config);

        let first = controller.take_screenshot(ScreenshotRequest::default()).await.unwrap();
        for _ in 0..2 {
            controller.take_screenshot(ScreenshotRequest::default()).await.unwrap();
        }

        assert_eq!(controller.temp_files().count(), 2);
        assert!(!first.path.exists());
    }

    #[tokio::test]
    async fn test_screenshot_invalid_regex() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _dir) = controller(mock);

        let result = controller
            .take_screenshot(ScreenshotRequest::for_window(WindowSelector::by_regex("(unclosed")))
            .await;
        assert!(matches!(result, Err(DesktopError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_health_reports_mock_backend() {
        let (controller, _dir) = controller(Arc::new(MockBackend::new()));
        let health = controller.health();
        assert!(health.ok);
        assert!(health.backend.starts_with("mock"));
    }
}
