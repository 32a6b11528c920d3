//! Error types for desktop automation operations
//!
//! Every failure from the input, capture, window or OCR libraries is wrapped
//! once into [`DesktopError`]. Each variant carries enough context to produce
//! a user-facing message plus an actionable remediation hint.
//!
//! # Structured Error Hints
//!
//! In addition to prose hints, errors provide machine-readable metadata via
//! [`ErrorHint`] so agent clients can pick a recovery action without parsing
//! text.
//!
//! ```rust,ignore
//! let error = DesktopError::WindowNotFound { selector };
//! let hint = error.structured_hint();
//!
//! if let Some(tool) = hint.suggested_tool {
//!     println!("Try calling: {}", tool);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{BackendType, WindowSelector};

/// Result type alias for desktop operations
pub type DesktopResult<T> = Result<T, DesktopError>;

/// Structured error hint for agent auto-recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHint {
    /// Human-readable description of the error and how to fix it
    pub message: String,

    /// Category of recovery action to attempt
    pub recovery_action: RecoveryAction,

    /// MCP tool name to call for recovery (if applicable)
    pub suggested_tool: Option<String>,

    /// Parameters to pass to the suggested tool
    pub tool_params: Option<serde_json::Value>,

    /// Whether the error is likely transient (retry may succeed)
    pub is_transient: bool,

    /// Error category for grouping/filtering
    pub category: ErrorCategory,
}

/// Category of recovery action a client can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Call a different tool to get more information
    CallTool,
    /// Retry the same operation
    Retry,
    /// Modify parameters and retry
    ModifyParams,
    /// Require user intervention
    RequireUser,
    /// No automated recovery possible
    None,
}

/// High-level error category for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Target not found (window, display)
    NotFound,
    /// Invalid parameters or configuration
    InvalidInput,
    /// Backend, platform or model not available
    Unavailable,
    /// Operation timed out
    Timeout,
    /// Refused by a safety guard
    SafetyStop,
    /// I/O or system error
    SystemError,
    /// Encoding, inference or image processing error
    ProcessingError,
}

/// Error type for desktop automation operations
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    /// No window title matched the selector
    #[error("No window found matching pattern: {}", .selector.title_pattern.as_deref().unwrap_or(""))]
    WindowNotFound {
        /// The selector that failed to match any window
        selector: WindowSelector,
    },

    /// Invalid parameter provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Key name not in the supported vocabulary
    #[error("Unknown key '{key}'")]
    UnknownKey {
        /// The key specification that failed to parse
        key: String,
    },

    /// Synthetic mouse or keyboard input failed
    #[error("Input action '{action}' failed: {reason}")]
    InputFailed {
        /// The action that failed (e.g., "click", "type_text")
        action: String,
        /// Reason reported by the input library
        reason: String,
    },

    /// Screen or window capture failed
    #[error("Screen capture failed: {reason}")]
    CaptureFailed {
        /// Reason reported by the capture library
        reason: String,
    },

    /// Platform call did not finish in time
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// The window manager refused to focus a window
    #[error("Failed to activate window '{title}': {reason}")]
    WindowActivationFailed {
        /// Title of the window that could not be activated
        title: String,
        /// Reason for the failure
        reason: String,
    },

    /// OCR models or runtime are not available
    #[error("OCR is unavailable: {reason}")]
    OcrUnavailable {
        /// Why the OCR engine could not be created
        reason: String,
    },

    /// OCR inference failed
    #[error("OCR failed: {reason}")]
    OcrFailed {
        /// Reason for the failure
        reason: String,
    },

    /// Image encoding failed
    #[error("Failed to encode image as {format}: {reason}")]
    EncodingFailed {
        /// Image format that failed
        format: String,
        /// Reason for encoding failure
        reason: String,
    },

    /// Input refused because the pointer is parked in a screen corner
    #[error("Fail-safe triggered: mouse pointer is in a screen corner at ({x}, {y})")]
    FailSafeTriggered {
        /// Pointer x coordinate
        x: i32,
        /// Pointer y coordinate
        y: i32,
    },

    /// Requested backend is not available
    #[error("Backend {backend} is not available on this platform")]
    BackendNotAvailable {
        /// Backend type that's unavailable
        backend: BackendType,
    },

    /// Requested capability is not supported by this backend
    #[error("Feature '{feature}' is not supported by backend {backend}")]
    NotSupported {
        /// Name of the unsupported feature
        feature: String,
        /// Backend that doesn't support the feature
        backend: BackendType,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl From<image::ImageError> for DesktopError {
    fn from(e: image::ImageError) -> Self {
        DesktopError::ImageError(e.to_string())
    }
}

impl DesktopError {
    /// Shorthand for [`DesktopError::InvalidParameter`]
    pub fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        DesktopError::InvalidParameter {
            parameter: parameter.to_string(),
            reason:    reason.into(),
        }
    }

    /// Shorthand for [`DesktopError::InputFailed`]
    pub fn input(action: &str, reason: impl std::fmt::Display) -> Self {
        DesktopError::InputFailed {
            action: action.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use desktop_core::{error::DesktopError, model::WindowSelector};
    ///
    /// let error = DesktopError::WindowNotFound {
    ///     selector: WindowSelector::by_title("Firefox"),
    /// };
    ///
    /// assert!(error.remediation_hint().contains("list_windows"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            DesktopError::WindowNotFound { .. } => {
                "Use the list_windows tool to see available window titles. Lower the threshold \
                 for looser fuzzy matching, or set use_regex for an exact pattern."
            }
            DesktopError::InvalidParameter { parameter, .. } => match parameter.as_str() {
                "threshold" => "Threshold must be between 0 and 100.",
                "scale_percent_for_ocr" => "scale_percent_for_ocr must be between 1 and 100.",
                "duration" => "Duration must be a finite number of seconds between 0 and 60.",
                "title_pattern" => "Check the regular expression syntax of title_pattern.",
                _ => "Check the parameter value against the tool schema.",
            },
            DesktopError::UnknownKey { .. } => {
                "Use a key name such as enter, tab, esc, space, backspace, delete, up, down, \
                 left, right, home, end, pageup, pagedown, f1-f12, ctrl, alt, shift, win, or a \
                 single character. Combine keys with '+', e.g. ctrl+c."
            }
            DesktopError::InputFailed { .. } => {
                "Synthetic input was rejected. Ensure the session allows input injection \
                 (an X11 or Windows desktop session, not a locked screen)."
            }
            DesktopError::CaptureFailed { .. } => {
                "Screen capture failed. Ensure a graphical session is running and the process \
                 is allowed to read the screen."
            }
            DesktopError::Timeout { .. } => {
                "The desktop did not respond in time. Retry the operation; if it persists the \
                 display server may be unresponsive."
            }
            DesktopError::WindowActivationFailed { .. } => {
                "The window manager refused to focus the window. Some window managers block \
                 focus stealing; try clicking the window instead."
            }
            DesktopError::OcrUnavailable { .. } => {
                "Configure the OCR detection model, recognition model and character dictionary \
                 (--ocr-det-model, --ocr-rec-model, --ocr-dict) and make the ONNX Runtime \
                 library available (--ort-dylib or ORT_DYLIB_PATH)."
            }
            DesktopError::OcrFailed { .. } => {
                "OCR inference failed. Check that the configured models match the expected \
                 PaddleOCR detection and recognition formats."
            }
            DesktopError::EncodingFailed { .. } => {
                "Image encoding failed. Try a different format (PNG, WebP, or JPEG)."
            }
            DesktopError::FailSafeTriggered { .. } => {
                "Move the mouse pointer away from the screen corner to resume automation."
            }
            DesktopError::BackendNotAvailable { backend } => match backend {
                BackendType::Wayland => {
                    "Wayland sessions do not allow synthetic input or window enumeration. Run \
                     the server in an X11 session or under XWayland with DISPLAY set."
                }
                BackendType::X11 => {
                    "X11 backend not available. Ensure you're running in an X11 session with \
                     DISPLAY environment variable set."
                }
                BackendType::Windows => "Windows backend only available on Windows OS.",
                BackendType::MacOS => "macOS is not supported by the native backend.",
                BackendType::None => {
                    "No desktop session detected. Start the server inside a graphical session."
                }
            },
            DesktopError::NotSupported { .. } => {
                "This feature is not supported by the current backend."
            }
            DesktopError::IoError(_) => {
                "An I/O error occurred. Check file permissions, disk space, and system resources."
            }
            DesktopError::ImageError(_) => {
                "Image processing failed. Ensure the image data is valid."
            }
        }
    }

    /// Returns a structured error hint for agent auto-recovery.
    ///
    /// # Example
    ///
    /// ```
    /// use desktop_core::{
    ///     error::{DesktopError, RecoveryAction},
    ///     model::WindowSelector,
    /// };
    ///
    /// let error = DesktopError::WindowNotFound {
    ///     selector: WindowSelector::by_title("Firefox"),
    /// };
    ///
    /// let hint = error.structured_hint();
    /// assert_eq!(hint.recovery_action, RecoveryAction::CallTool);
    /// assert_eq!(hint.suggested_tool.as_deref(), Some("list_windows"));
    /// ```
    pub fn structured_hint(&self) -> ErrorHint {
        let message = self.remediation_hint().to_string();
        let hint = |recovery_action, category, is_transient| ErrorHint {
            message: message.clone(),
            recovery_action,
            suggested_tool: None,
            tool_params: None,
            is_transient,
            category,
        };

        match self {
            DesktopError::WindowNotFound { selector } => ErrorHint {
                suggested_tool: Some("list_windows".to_string()),
                tool_params: Some(serde_json::json!({
                    "hint": "Look for a title matching the original pattern",
                    "original_pattern": selector.title_pattern,
                    "threshold": selector.threshold,
                })),
                ..hint(RecoveryAction::CallTool, ErrorCategory::NotFound, false)
            },
            DesktopError::InvalidParameter { parameter, reason } => ErrorHint {
                tool_params: Some(serde_json::json!({
                    "invalid_parameter": parameter,
                    "reason": reason,
                    "valid_ranges": match parameter.as_str() {
                        "threshold" => serde_json::json!({"min": 0, "max": 100}),
                        "scale_percent_for_ocr" => serde_json::json!({"min": 1, "max": 100}),
                        "duration" => serde_json::json!({"min": 0.0, "max": 60.0}),
                        _ => serde_json::json!(null),
                    },
                })),
                ..hint(RecoveryAction::ModifyParams, ErrorCategory::InvalidInput, false)
            },
            DesktopError::UnknownKey { key } => ErrorHint {
                tool_params: Some(serde_json::json!({ "invalid_key": key })),
                ..hint(RecoveryAction::ModifyParams, ErrorCategory::InvalidInput, false)
            },
            DesktopError::InputFailed { .. } => {
                hint(RecoveryAction::Retry, ErrorCategory::SystemError, true)
            }
            DesktopError::CaptureFailed { .. } => {
                hint(RecoveryAction::Retry, ErrorCategory::SystemError, true)
            }
            DesktopError::Timeout { duration_ms } => ErrorHint {
                tool_params: Some(serde_json::json!({ "original_timeout_ms": duration_ms })),
                ..hint(RecoveryAction::Retry, ErrorCategory::Timeout, true)
            },
            DesktopError::WindowActivationFailed { .. } => ErrorHint {
                suggested_tool: Some("click_screen".to_string()),
                ..hint(RecoveryAction::CallTool, ErrorCategory::SystemError, true)
            },
            DesktopError::OcrUnavailable { .. } => ErrorHint {
                tool_params: Some(serde_json::json!({ "with_ocr_text_and_coords": false })),
                ..hint(RecoveryAction::ModifyParams, ErrorCategory::Unavailable, false)
            },
            DesktopError::OcrFailed { .. } => {
                hint(RecoveryAction::None, ErrorCategory::ProcessingError, false)
            }
            DesktopError::EncodingFailed { format, .. } => ErrorHint {
                tool_params: Some(serde_json::json!({
                    "suggestion": "Try a different format",
                    "failed_format": format,
                })),
                ..hint(RecoveryAction::ModifyParams, ErrorCategory::ProcessingError, false)
            },
            DesktopError::FailSafeTriggered { .. } => {
                hint(RecoveryAction::RequireUser, ErrorCategory::SafetyStop, false)
            }
            DesktopError::BackendNotAvailable { backend } => ErrorHint {
                tool_params: Some(serde_json::json!({ "unavailable_backend": backend })),
                ..hint(RecoveryAction::None, ErrorCategory::Unavailable, false)
            },
            DesktopError::NotSupported { feature, .. } => ErrorHint {
                tool_params: Some(serde_json::json!({ "feature": feature })),
                ..hint(RecoveryAction::None, ErrorCategory::Unavailable, false)
            },
            DesktopError::IoError(_) => {
                hint(RecoveryAction::Retry, ErrorCategory::SystemError, true)
            }
            DesktopError::ImageError(_) => {
                hint(RecoveryAction::None, ErrorCategory::ProcessingError, false)
            }
        }
    }
}
