//! MCP Server Test Harness
//!
//! Wraps a `DesktopMcpServer` over a `MockBackend` and exposes the tools as
//! plain async calls, plus validators for the multi-part screenshot result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::mcp_harness::{ContentValidator, McpTestContext};
//!
//! #[tokio::test]
//! async fn test_screenshot() {
//!     let ctx = McpTestContext::new_with_mock();
//!     let result = ctx.screenshot_of("Firefox").await.unwrap();
//!     let parts = ContentValidator::validate_screenshot_result(&result, "image/png").unwrap();
//!     assert!(ContentValidator::is_valid_png(&parts.image_bytes));
//! }
//! ```

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};
use desktop_core::{
    capture::{MockBackend, MockEvent, composite_from_mock},
    config::DesktopConfig,
    model::{HealthCheckResponse, WindowInfo},
};
use desktop_mcp_server::mcp::{
    ActivateWindowParams, ClickScreenParams, DesktopMcpServer, DragMouseParams, MoveMouseParams,
    PressKeyParams, TakeScreenshotParams, TypeTextParams,
};
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, ErrorData},
};

pub type ToolResult = Result<CallToolResult, ErrorData>;

/// Test fixture for MCP server integration tests
///
/// Keeps a handle to the mock so tests can inspect recorded input events
/// and the focused window after a tool call.
pub struct McpTestContext {
    /// The MCP server instance
    pub server: DesktopMcpServer,
    /// The mock behind every capability
    pub mock:   Arc<MockBackend>,
    /// Screenshot directory, removed with the context
    dir:        tempfile::TempDir,
}

impl McpTestContext {
    /// Default mock desktop with no settle delays
    pub fn new_with_mock() -> Self {
        Self::new_with_configured_mock(MockBackend::new())
    }

    /// Use a pre-configured mock, e.g. with injected errors or windows
    pub fn new_with_configured_mock(mock: MockBackend) -> Self {
        Self::with_config(mock, DesktopConfig::immediate())
    }

    /// Full control over the mock and the controller configuration
    ///
    /// The screenshot directory is always redirected to a temp dir.
    pub fn with_config(mock: MockBackend, config: DesktopConfig) -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        let config = DesktopConfig {
            screenshot_dir: Some(dir.path().to_path_buf()),
            ..config
        };
        let mock = Arc::new(mock);
        let backend = Arc::new(composite_from_mock(Arc::clone(&mock)));
        Self {
            server: DesktopMcpServer::new(backend, config),
            mock,
            dir,
        }
    }

    // --- Tool invocation helpers ---

    pub async fn health_check(&self) -> ToolResult {
        self.server.health_check().await
    }

    pub async fn list_windows(&self) -> ToolResult {
        self.server.list_windows().await
    }

    pub async fn get_screen_size(&self) -> ToolResult {
        self.server.get_screen_size().await
    }

    pub async fn click(&self, x: i32, y: i32) -> ToolResult {
        self.server
            .click_screen(Parameters(ClickScreenParams {
                x,
                y,
                button: Default::default(),
                clicks: 1,
            }))
            .await
    }

    pub async fn move_mouse(&self, x: i32, y: i32) -> ToolResult {
        self.server
            .move_mouse(Parameters(MoveMouseParams { x, y }))
            .await
    }

    pub async fn drag(&self, from: (i32, i32), to: (i32, i32), duration: f64) -> ToolResult {
        self.server
            .drag_mouse(Parameters(DragMouseParams {
                from_x: from.0,
                from_y: from.1,
                to_x: to.0,
                to_y: to.1,
                duration,
            }))
            .await
    }

    pub async fn type_text(&self, text: &str) -> ToolResult {
        self.server
            .type_text(Parameters(TypeTextParams {
                text: text.to_string(),
            }))
            .await
    }

    pub async fn press_key(&self, key: &str) -> ToolResult {
        self.server
            .press_key(Parameters(PressKeyParams {
                key: key.to_string(),
            }))
            .await
    }

    pub async fn activate(&self, title: &str) -> ToolResult {
        self.server
            .activate_window(Parameters(ActivateWindowParams {
                title_pattern: title.to_string(),
                use_regex:     false,
                threshold:     60,
            }))
            .await
    }

    pub async fn take_screenshot(&self, params: TakeScreenshotParams) -> ToolResult {
        self.server.take_screenshot(Parameters(params)).await
    }

    /// Convenience: screenshot of the window matching `title`
    pub async fn screenshot_of(&self, title: &str) -> ToolResult {
        self.take_screenshot(TakeScreenshotParams {
            title_pattern: Some(title.to_string()),
            ..Default::default()
        })
        .await
    }

    // --- Utility methods ---

    pub fn input_events(&self) -> Vec<MockEvent> {
        self.mock.input_events()
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn temp_file_count(&self) -> usize {
        self.server.controller().temp_files().count()
    }
}

// ============================================================================
// Content Validators
// ============================================================================

/// Parsed components of a take_screenshot result
#[derive(Debug)]
pub struct ScreenshotParts {
    /// Decoded image bytes
    pub image_bytes: Vec<u8>,
    /// file:// URI extracted from the file reference
    pub file_uri:    String,
    /// Parsed metadata JSON
    pub metadata:    serde_json::Value,
    /// Parsed OCR JSON, when present
    pub ocr:         Option<serde_json::Value>,
}

/// Validation utilities for MCP tool responses
pub struct ContentValidator;

impl ContentValidator {
    /// Text of the content item at `index`
    pub fn text_at(result: &CallToolResult, index: usize) -> Result<String, String> {
        let content = result
            .content
            .get(index)
            .ok_or_else(|| format!("Missing content item {}", index))?;
        content
            .as_text()
            .map(|t| t.text.clone())
            .ok_or_else(|| format!("Content item {} is not text", index))
    }

    /// Parses the content item at `index` as JSON
    pub fn json_at(result: &CallToolResult, index: usize) -> Result<serde_json::Value, String> {
        let text = Self::text_at(result, index)?;
        serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {}", e))
    }

    /// Decodes the base64 image in the first content item
    pub fn validate_base64_image(
        result: &CallToolResult,
        expected_mime: &str,
    ) -> Result<Vec<u8>, String> {
        let image = result
            .content
            .first()
            .ok_or("Missing image content")?
            .as_image()
            .ok_or("First content is not an image")?;

        if image.mime_type != expected_mime {
            return Err(format!(
                "Expected MIME type '{}', got '{}'",
                expected_mime, image.mime_type
            ));
        }

        STANDARD
            .decode(&image.data)
            .map_err(|e| format!("Invalid base64: {}", e))
    }

    /// Extracts the file:// URI from the markdown file reference
    pub fn validate_file_uri(result: &CallToolResult) -> Result<String, String> {
        let text = Self::text_at(result, 1)?;
        let start = text.find("file://").ok_or("File reference missing file:// URI")?;
        let rest = &text[start..];
        let end = rest.find(')').unwrap_or(rest.len());
        Ok(rest[..end].to_string())
    }

    /// Validates the full screenshot result structure
    ///
    /// 1. Image (base64)
    /// 2. File reference (markdown with file:// URI)
    /// 3. Metadata JSON
    /// 4. OCR JSON array (only when OCR ran)
    pub fn validate_screenshot_result(
        result: &CallToolResult,
        expected_mime: &str,
    ) -> Result<ScreenshotParts, String> {
        if result.is_error.unwrap_or(false) {
            return Err("Result is marked as error".to_string());
        }
        if !(3..=4).contains(&result.content.len()) {
            return Err(format!(
                "Expected 3 or 4 content items, got {}",
                result.content.len()
            ));
        }

        let image_bytes = Self::validate_base64_image(result, expected_mime)?;
        let file_uri = Self::validate_file_uri(result)?;
        let metadata = Self::json_at(result, 2)?;
        let ocr = if result.content.len() == 4 {
            Some(Self::json_at(result, 3)?)
        } else {
            None
        };

        Ok(ScreenshotParts {
            image_bytes,
            file_uri,
            metadata,
            ocr,
        })
    }

    /// PNG files start with 0x89 0x50 0x4E 0x47 0x0D 0x0A 0x1A 0x0A
    pub fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() >= 8 && bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a])
    }

    /// JPEG files start with 0xFF 0xD8
    pub fn is_valid_jpeg(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0xff, 0xd8])
    }
}

pub fn parse_health_check(result: &CallToolResult) -> Result<HealthCheckResponse, String> {
    let text = ContentValidator::text_at(result, 0)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid health check JSON: {}", e))
}

pub fn parse_window_list(result: &CallToolResult) -> Result<Vec<WindowInfo>, String> {
    let text = ContentValidator::text_at(result, 0)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid window list JSON: {}", e))
}
