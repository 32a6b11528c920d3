//! MCP content builders for screenshot results
//!
//! A screenshot goes back to the client as inline image content (for
//! immediate viewing), a `file://` reference to the stored copy, a metadata
//! JSON block, and optionally the OCR boxes as JSON.
//!
//! # Examples
//!
//! ```
//! use desktop_mcp_server::mcp_content::build_image_content;
//!
//! let content = build_image_content(&[137, 80, 78, 71], "image/png");
//! assert!(content.as_image().is_some());
//! ```

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use desktop_core::automation::ScreenshotOutcome;
use rmcp::model::{CallToolResult, Content};

/// Builds MCP image content from encoded image bytes
pub fn build_image_content(data: &[u8], mime_type: &str) -> Content {
    Content::image(STANDARD.encode(data), mime_type)
}

/// Converts a path to a `file://` URI
pub fn file_uri(path: &Path) -> String {
    let path_str = path.to_string_lossy();

    #[cfg(target_os = "windows")]
    let uri = format!("file:///{}", path_str.replace('\\', "/"));

    #[cfg(not(target_os = "windows"))]
    let uri = format!("file://{}", path_str);

    uri
}

/// Builds a text reference to a stored screenshot file
///
/// ```
/// use std::path::PathBuf;
///
/// use desktop_mcp_server::mcp_content::build_resource_link;
///
/// let content = build_resource_link(&PathBuf::from("/tmp/shot.png"), "image/png", 12345);
/// let text = &content.as_text().unwrap().text;
/// assert!(text.contains("file:///tmp/shot.png"));
/// assert!(text.contains("12345 bytes"));
/// ```
pub fn build_resource_link(path: &Path, mime_type: &str, size: u64) -> Content {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("screenshot.png");
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    Content::text(format!(
        "## Screenshot File Reference\n\n**File:** [{}]({})\n**Timestamp:** {}\n**Size:** {} \
         bytes\n**MIME Type:** {}",
        filename,
        file_uri(path),
        timestamp,
        size,
        mime_type
    ))
}

/// Metadata block describing a screenshot
pub fn screenshot_metadata(outcome: &ScreenshotOutcome) -> serde_json::Value {
    serde_json::json!({
        "dimensions": [outcome.width, outcome.height],
        "format": outcome.format.to_string(),
        "size_bytes": outcome.size_bytes,
        "file_path": outcome.path.to_string_lossy(),
        "saved_path": outcome.saved_path.as_ref().map(|p| p.to_string_lossy()),
        "window": outcome.window.as_ref().map(|w| serde_json::json!({
            "id": w.id,
            "title": w.title,
            "left": w.left,
            "top": w.top,
        })),
        "ocr_boxes": outcome.ocr.as_ref().map(Vec::len),
    })
}

/// Builds the full `take_screenshot` result
///
/// Content order: image, file reference, metadata JSON, then the OCR JSON
/// array when OCR ran.
pub fn build_screenshot_result(outcome: &ScreenshotOutcome) -> CallToolResult {
    let mime_type = outcome.format.mime_type();

    let mut content = vec![
        build_image_content(&outcome.data, mime_type),
        build_resource_link(&outcome.path, mime_type, outcome.size_bytes),
    ];

    let metadata = serde_json::to_string_pretty(&screenshot_metadata(outcome))
        .unwrap_or_else(|_| r#"{"error": "Failed to serialize metadata"}"#.to_string());
    content.push(Content::text(metadata));

    if let Some(boxes) = &outcome.ocr {
        let ocr = serde_json::to_string(boxes).unwrap_or_else(|_| "[]".to_string());
        content.push(Content::text(ocr));
    }

    CallToolResult::success(content)
}
