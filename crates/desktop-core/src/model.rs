//! Data models and type definitions for desktop-control-mcp
//!
//! This module defines the core types used throughout the workspace:
//! - Platform and backend detection types
//! - Health check response structures
//! - Screen geometry (points, regions, sizes)
//! - Window metadata and window selectors
//! - OCR text boxes in their wire representation

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Represents the display backend type for the current platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// No backend detected or not yet initialized
    None,
    /// Wayland display server (Linux)
    Wayland,
    /// X11 display server (Linux)
    X11,
    /// Windows desktop
    Windows,
    /// macOS desktop
    #[serde(rename = "macos")]
    MacOS,
}

impl BackendType {
    /// Returns the backend type as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::None => "none",
            BackendType::Wayland => "wayland",
            BackendType::X11 => "x11",
            BackendType::Windows => "windows",
            BackendType::MacOS => "macos",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform information including OS and display backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformInfo {
    /// Operating system name (e.g., "linux", "windows", "macos")
    pub os:      String,
    /// Detected display backend
    pub backend: BackendType,
}

impl PlatformInfo {
    /// Creates a new PlatformInfo instance
    pub fn new(os: String, backend: BackendType) -> Self {
        Self { os, backend }
    }
}

/// Response structure for the health_check MCP tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthCheckResponse {
    /// Platform/OS name
    pub platform: String,
    /// Name of the automation backend serving requests
    pub backend:  String,
    /// Whether the server is functioning correctly
    pub ok:       bool,
    /// Server version
    pub version:  String,
}

impl HealthCheckResponse {
    /// Creates a successful health check response from platform info
    ///
    /// `backend_name` is the name of the wired automation backend ("native",
    /// "mock"); when empty, the detected display backend is reported instead.
    pub fn from_platform(info: PlatformInfo, backend_name: &str) -> Self {
        let backend = if backend_name.is_empty() {
            info.backend.as_str().to_string()
        } else {
            format!("{}/{}", backend_name, info.backend)
        };
        Self {
            platform: info.os,
            backend,
            ok: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Width and height of the primary display in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenSize {
    pub width:  u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if the point lies in one of the four corner pixels
    pub fn is_corner(&self, point: Point) -> bool {
        let max_x = self.width.saturating_sub(1) as i32;
        let max_y = self.height.saturating_sub(1) as i32;
        (point.x == 0 || point.x == max_x) && (point.y == 0 || point.y == max_y)
    }
}

impl std::fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A point in absolute screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangular screen area
///
/// The origin may be negative: windows on a monitor placed left of or above
/// the primary display report negative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection of two regions, `None` when they do not overlap
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left as i64 || bottom <= top as i64 {
            return None;
        }

        Some(Region::new(
            left,
            top,
            (right - left as i64) as u32,
            (bottom - top as i64) as u32,
        ))
    }
}

/// Mouse button selector accepted by click tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for MouseButton {
    type Err = crate::error::DesktopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            _ => Err(crate::error::DesktopError::invalid(
                "button",
                format!("'{}' is not one of left, right, middle", s),
            )),
        }
    }
}

/// Whether a button or key is pressed, released, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressAction {
    Press,
    Release,
    Click,
}

/// Platform-specific window identifier (X11 window id, HWND, mock id)
pub type WindowHandle = String;

/// Metadata for a top-level window with a non-empty title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowInfo {
    /// Platform-specific window identifier
    pub id:           WindowHandle,
    /// Window title
    pub title:        String,
    /// Owning application name
    pub app_name:     String,
    /// Process ID of the window owner
    pub pid:          u32,
    /// Left edge in screen coordinates
    pub left:         i32,
    /// Top edge in screen coordinates
    pub top:          i32,
    pub width:        u32,
    pub height:       u32,
    /// Whether this window currently has input focus
    pub is_active:    bool,
    pub is_visible:   bool,
    pub is_minimized: bool,
    pub is_maximized: bool,
}

impl WindowInfo {
    /// Creates a visible, unfocused window record
    pub fn new(id: impl Into<String>, title: impl Into<String>, region: Region) -> Self {
        Self {
            id:           id.into(),
            title:        title.into(),
            app_name:     String::new(),
            pid:          0,
            left:         region.x,
            top:          region.y,
            width:        region.width,
            height:       region.height,
            is_active:    false,
            is_visible:   true,
            is_minimized: false,
            is_maximized: false,
        }
    }

    /// Screen area covered by the window
    pub fn region(&self) -> Region {
        Region::new(self.left, self.top, self.width, self.height)
    }
}

/// Default fuzzy score threshold (0-100) for title matching
pub const DEFAULT_MATCH_THRESHOLD: u8 = 60;

/// Criteria for picking one window out of the enumerated list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowSelector {
    /// Title pattern; fuzzy text by default, regex when `use_regex` is set
    pub title_pattern: Option<String>,
    /// Interpret `title_pattern` as a case-insensitive regex
    #[serde(default)]
    pub use_regex:     bool,
    /// Minimum fuzzy score (0-100) required for a match
    #[serde(default = "default_threshold")]
    pub threshold:     u8,
}

fn default_threshold() -> u8 {
    DEFAULT_MATCH_THRESHOLD
}

impl Default for WindowSelector {
    fn default() -> Self {
        Self {
            title_pattern: None,
            use_regex:     false,
            threshold:     DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl WindowSelector {
    /// Fuzzy title selector with the default threshold
    pub fn by_title(pattern: impl Into<String>) -> Self {
        Self {
            title_pattern: Some(pattern.into()),
            ..Default::default()
        }
    }

    /// Case-insensitive regex title selector
    pub fn by_regex(pattern: impl Into<String>) -> Self {
        Self {
            title_pattern: Some(pattern.into()),
            use_regex: true,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns the pattern if it is present and non-blank
    pub fn pattern(&self) -> Option<&str> {
        self.title_pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

/// Supported output image formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG (lossless) - default
    #[default]
    Png,
    /// JPEG (lossy)
    Jpeg,
    /// WebP (lossless with the image crate)
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = crate::error::DesktopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            _ => Err(crate::error::DesktopError::invalid(
                "format",
                format!("'{}' is not one of png, jpeg, webp", s),
            )),
        }
    }
}

/// Four corners of a text box, clockwise from top-left
pub type Quad = [[f32; 2]; 4];

/// One recognized line of text
///
/// Serialized as `[[[x, y], ...4 corners], "text", confidence]` so clients
/// receive the same triple shape regardless of the OCR engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub corners:    Quad,
    pub text:       String,
    pub confidence: f32,
}

impl TextBox {
    /// Builds an axis-aligned box from its bounding rectangle
    pub fn from_rect(left: f32, top: f32, right: f32, bottom: f32, text: String, confidence: f32) -> Self {
        Self {
            corners: [[left, top], [right, top], [right, bottom], [left, bottom]],
            text,
            confidence,
        }
    }

    /// Scales every corner by `factor` and then shifts it by `offset`
    pub fn rescaled(mut self, factor: f32, offset: Point) -> Self {
        for corner in &mut self.corners {
            corner[0] = corner[0] * factor + offset.x as f32;
            corner[1] = corner[1] * factor + offset.y as f32;
        }
        self
    }

    /// Top-left corner
    pub fn origin(&self) -> [f32; 2] {
        self.corners[0]
    }
}

impl Serialize for TextBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.corners, &self.text, self.confidence).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (corners, text, confidence) = <(Quad, String, f32)>::deserialize(deserializer)?;
        Ok(Self {
            corners,
            text,
            confidence,
        })
    }
}
