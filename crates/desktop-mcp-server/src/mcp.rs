//! MCP service implementation with tool routing
//!
//! This module provides the desktop-control MCP server: one tool per
//! [`DesktopController`] operation plus `tool_version` and `health_check`.
//! Argument validation beyond the JSON schema happens in the controller;
//! this layer only converts parameters and shapes results.

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorData as McpError, Implementation, ServerCapabilities,
        ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mcp_content::build_screenshot_result;
use desktop_core::{
    automation::{DEFAULT_DRAG_SECONDS, DesktopController, ScreenshotRequest},
    capture::{DesktopBackend, MockBackend, composite_from_mock},
    config::DesktopConfig,
    error::DesktopError,
    model::{DEFAULT_MATCH_THRESHOLD, ImageFormat, MouseButton, Point, WindowSelector},
};

const SERVER_INSTRUCTIONS: &str = "Desktop automation tools. Coordinates are absolute screen \
pixels with the origin at the top-left of the primary screen. Use list_windows to discover \
window titles, take_screenshot with with_ocr_text_and_coords to locate text, then \
click_screen at the returned coordinates. Moving the pointer into a screen corner stops all \
input (fail-safe).";

fn default_clicks() -> u32 {
    1
}

fn default_drag_duration() -> f64 {
    DEFAULT_DRAG_SECONDS
}

fn default_threshold() -> u8 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_ocr_scale() -> u32 {
    100
}

/// Parameters for the click_screen tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ClickScreenParams {
    /// X coordinate in screen pixels
    pub x:      i32,
    /// Y coordinate in screen pixels
    pub y:      i32,
    /// Mouse button: "left", "right" or "middle" (default: "left")
    #[serde(default)]
    pub button: MouseButton,
    /// Number of clicks, 1 to 3 (default: 1)
    #[serde(default = "default_clicks")]
    pub clicks: u32,
}

/// Parameters for the move_mouse tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct MoveMouseParams {
    /// X coordinate in screen pixels
    pub x: i32,
    /// Y coordinate in screen pixels
    pub y: i32,
}

/// Parameters for the drag_mouse tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DragMouseParams {
    /// Start X coordinate
    pub from_x:   i32,
    /// Start Y coordinate
    pub from_y:   i32,
    /// End X coordinate
    pub to_x:     i32,
    /// End Y coordinate
    pub to_y:     i32,
    /// Drag duration in seconds, 0 to 60 (default: 0.5)
    #[serde(default = "default_drag_duration")]
    pub duration: f64,
}

/// Parameters for the type_text tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TypeTextParams {
    /// Text to type at the current keyboard focus
    pub text: String,
}

/// Parameters for the press_key tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PressKeyParams {
    /// Key name or '+' chord, e.g. "enter", "f5", "ctrl+c", "ctrl+shift+t"
    pub key: String,
}

/// Parameters for the activate_window tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ActivateWindowParams {
    /// Window title to look for (fuzzy substring, or a regex with use_regex)
    pub title_pattern: String,
    /// Treat title_pattern as a regular expression (default: false)
    #[serde(default)]
    pub use_regex:     bool,
    /// Minimum fuzzy match score, 0 to 100 (default: 60)
    #[serde(default = "default_threshold")]
    pub threshold:     u8,
}

/// Parameters for the take_screenshot tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TakeScreenshotParams {
    /// Window title to capture; the whole screen when absent or unmatched
    #[serde(default)]
    pub title_pattern:            Option<String>,
    /// Treat title_pattern as a regular expression (default: false)
    #[serde(default)]
    pub use_regex:                bool,
    /// Minimum fuzzy match score, 0 to 100 (default: 60)
    #[serde(default = "default_threshold")]
    pub threshold:                u8,
    /// Run OCR and return text boxes in screen coordinates (default: false)
    #[serde(default)]
    pub with_ocr_text_and_coords: bool,
    /// Downscale to this percentage before OCR, 1 to 100 (default: 100)
    #[serde(default = "default_ocr_scale")]
    pub scale_percent_for_ocr:    u32,
    /// Also copy the screenshot to the Downloads directory (default: false)
    #[serde(default)]
    pub save_to_downloads:        bool,
    /// Output format: "png", "jpeg" or "webp" (default: "png")
    #[serde(default)]
    pub format:                   ImageFormat,
}

impl Default for TakeScreenshotParams {
    fn default() -> Self {
        Self {
            title_pattern:            None,
            use_regex:                false,
            threshold:                DEFAULT_MATCH_THRESHOLD,
            with_ocr_text_and_coords: false,
            scale_percent_for_ocr:    100,
            save_to_downloads:        false,
            format:                   ImageFormat::Png,
        }
    }
}

fn selector(pattern: Option<String>, use_regex: bool, threshold: u8) -> Result<WindowSelector, McpError> {
    if threshold > 100 {
        return Err(McpError::invalid_params(
            format!("Invalid parameter 'threshold': {} is outside 0..=100", threshold),
            None,
        ));
    }
    Ok(WindowSelector {
        title_pattern: pattern,
        use_regex,
        threshold,
    })
}

fn ocr_scale(percent: u32) -> Result<u8, McpError> {
    u8::try_from(percent)
        .ok()
        .filter(|p| (1..=100).contains(p))
        .ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid parameter 'scale_percent_for_ocr': {} is outside 1..=100", percent),
                None,
            )
        })
}

/// Converts a DesktopError to an MCP error
///
/// Caller mistakes become `invalid_params`; everything else is an
/// `internal_error`. The message carries the remediation hint and the data
/// field the structured hint.
fn convert_desktop_error_to_mcp(error: DesktopError) -> McpError {
    let message = format!("{}. {}", error, error.remediation_hint());
    let data = serde_json::to_value(error.structured_hint()).ok();

    match error {
        DesktopError::InvalidParameter { .. }
        | DesktopError::UnknownKey { .. }
        | DesktopError::WindowNotFound { .. } => McpError::invalid_params(message, data),
        _ => McpError::internal_error(message, data),
    }
}

fn to_json_text<T: Serialize>(value: &T, what: &str) -> Result<CallToolResult, McpError> {
    let json_str = serde_json::to_string(value).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize {}: {}", what, e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(json_str)]))
}

/// Desktop control MCP server
///
/// # Tools
///
/// - `tool_version`, `health_check`: server version and platform detection
/// - `click_screen`, `move_mouse`, `drag_mouse`: pointer input
/// - `type_text`, `press_key`: keyboard input
/// - `get_screen_size`, `list_windows`, `activate_window`: desktop queries
/// - `take_screenshot`: window or screen capture with optional OCR
#[derive(Clone)]
pub struct DesktopMcpServer {
    /// Tool router for dispatching tool calls
    tool_router: ToolRouter<Self>,
    /// Operations shared by every tool
    controller:  Arc<DesktopController>,
}

#[tool_router]
impl DesktopMcpServer {
    /// Creates a server over `backend`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use desktop_core::{
    ///     capture::{MockBackend, composite_from_mock},
    ///     config::DesktopConfig,
    /// };
    /// use desktop_mcp_server::mcp::DesktopMcpServer;
    ///
    /// let backend = Arc::new(composite_from_mock(Arc::new(MockBackend::new())));
    /// let server = DesktopMcpServer::new(backend, DesktopConfig::immediate());
    /// ```
    pub fn new(backend: Arc<DesktopBackend>, config: DesktopConfig) -> Self {
        Self::with_controller(Arc::new(DesktopController::new(backend, config)))
    }

    /// Creates a server around an existing controller
    pub fn with_controller(controller: Arc<DesktopController>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            controller,
        }
    }

    /// Creates a server over a fresh MockBackend with no settle delays
    pub fn new_with_mock() -> Self {
        let backend = Arc::new(composite_from_mock(Arc::new(MockBackend::new())));
        Self::new(backend, DesktopConfig::immediate())
    }

    pub fn controller(&self) -> &Arc<DesktopController> {
        &self.controller
    }

    #[tool(description = "Return the version of the desktop-control server")]
    pub async fn tool_version(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(env!("CARGO_PKG_VERSION"))]))
    }

    /// Health check tool - reports the platform and the active backend
    ///
    /// Response:
    /// ```json
    /// {
    ///   "content": [{
    ///     "type": "text",
    ///     "text": "{\"platform\":\"linux\",\"backend\":\"x11\",\"ok\":true,\"version\":\"0.2.7\"}"
    ///   }]
    /// }
    /// ```
    #[tool(description = "Check server health and detect platform/backend")]
    pub async fn health_check(&self) -> Result<CallToolResult, McpError> {
        to_json_text(&self.controller.health(), "health check response")
    }

    /// Clicks at absolute screen coordinates
    ///
    /// Request:
    /// ```json
    /// {
    ///   "method": "tools/call",
    ///   "params": {
    ///     "name": "click_screen",
    ///     "arguments": { "x": 640, "y": 400, "button": "right", "clicks": 1 }
    ///   }
    /// }
    /// ```
    #[tool(description = "Click at screen coordinates (x, y). Optional button (left, right, \
                          middle) and clicks (1-3, use 2 for double-click).")]
    pub async fn click_screen(
        &self,
        Parameters(params): Parameters<ClickScreenParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .controller
            .click(Point::new(params.x, params.y), params.button, params.clicks)
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Move the mouse pointer to screen coordinates (x, y)")]
    pub async fn move_mouse(
        &self,
        Parameters(params): Parameters<MoveMouseParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .controller
            .move_mouse(Point::new(params.x, params.y))
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Drag with the left mouse button from (from_x, from_y) to (to_x, to_y) \
                          over duration seconds (default 0.5)")]
    pub async fn drag_mouse(
        &self,
        Parameters(params): Parameters<DragMouseParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .controller
            .drag_mouse(
                Point::new(params.from_x, params.from_y),
                Point::new(params.to_x, params.to_y),
                params.duration,
            )
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Type text at the current keyboard focus")]
    pub async fn type_text(
        &self,
        Parameters(params): Parameters<TypeTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .controller
            .type_text(&params.text)
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Press a key or key combination, e.g. 'enter', 'tab', 'ctrl+c', \
                          'alt+f4', 'ctrl+shift+t'")]
    pub async fn press_key(
        &self,
        Parameters(params): Parameters<PressKeyParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .controller
            .press_key(&params.key)
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Get the primary screen size in pixels")]
    pub async fn get_screen_size(&self) -> Result<CallToolResult, McpError> {
        let size = self
            .controller
            .screen_size()
            .await
            .map_err(convert_desktop_error_to_mcp)?;

        let response = serde_json::json!({
            "width": size.width,
            "height": size.height,
            "message": format!("Screen size: {}", size),
        });
        to_json_text(&response, "screen size")
    }

    /// Lists top-level windows with a title
    ///
    /// Returns a JSON array of window objects (id, title, app_name, pid,
    /// geometry and state flags).
    #[tool(description = "List open windows with their titles, positions and sizes")]
    pub async fn list_windows(&self) -> Result<CallToolResult, McpError> {
        let windows = self
            .controller
            .list_windows()
            .await
            .map_err(convert_desktop_error_to_mcp)?;
        to_json_text(&windows, "window list")
    }

    #[tool(description = "Bring the window whose title matches title_pattern to the \
                          foreground. Fuzzy match by default, regex with use_regex.")]
    pub async fn activate_window(
        &self,
        Parameters(params): Parameters<ActivateWindowParams>,
    ) -> Result<CallToolResult, McpError> {
        let selector = selector(Some(params.title_pattern), params.use_regex, params.threshold)?;
        let window = self
            .controller
            .activate_window(&selector)
            .await
            .map_err(convert_desktop_error_to_mcp)?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Successfully activated window: '{}'",
            window.title
        ))]))
    }

    /// Captures a window or the full screen
    ///
    /// Returns inline image content, a `file://` reference to the stored
    /// copy, a metadata JSON block and, with `with_ocr_text_and_coords`, a
    /// JSON array of `[[corners], text, confidence]` entries in absolute
    /// screen coordinates.
    ///
    /// Request:
    /// ```json
    /// {
    ///   "method": "tools/call",
    ///   "params": {
    ///     "name": "take_screenshot",
    ///     "arguments": {
    ///       "title_pattern": "Firefox",
    ///       "with_ocr_text_and_coords": true,
    ///       "scale_percent_for_ocr": 50
    ///     }
    ///   }
    /// }
    /// ```
    #[tool(description = "Take a screenshot of the window matching title_pattern, or of the \
                          whole screen. With with_ocr_text_and_coords, also returns detected \
                          text with screen coordinates usable by click_screen.")]
    pub async fn take_screenshot(
        &self,
        Parameters(params): Parameters<TakeScreenshotParams>,
    ) -> Result<CallToolResult, McpError> {
        let selector = selector(params.title_pattern, params.use_regex, params.threshold)?;
        let scale_percent = if params.with_ocr_text_and_coords {
            ocr_scale(params.scale_percent_for_ocr)?
        } else {
            100
        };
        let request = ScreenshotRequest {
            selector,
            with_ocr: params.with_ocr_text_and_coords,
            scale_percent,
            save_to_downloads: params.save_to_downloads,
            format: params.format,
        };

        let outcome = self
            .controller
            .take_screenshot(request)
            .await
            .map_err(convert_desktop_error_to_mcp)?;

        tracing::info!(
            "Screenshot {}x{} stored at {}",
            outcome.width,
            outcome.height,
            outcome.path.display()
        );
        Ok(build_screenshot_result(&outcome))
    }
}

impl Default for DesktopMcpServer {
    fn default() -> Self {
        Self::new_with_mock()
    }
}

#[tool_handler]
impl ServerHandler for DesktopMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "desktop-control-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}
