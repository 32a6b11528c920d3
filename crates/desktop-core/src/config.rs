//! Runtime configuration for the desktop controller
//!
//! Binaries build a [`DesktopConfig`] from command-line flags and
//! environment variables; library users can start from
//! [`DesktopConfig::default()`] and override single fields.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{DesktopError, DesktopResult};

/// Delay after activating a window before it is captured
pub const DEFAULT_ACTIVATION_SETTLE_MS: u64 = 500;

/// Delay after restoring the previously active window
pub const DEFAULT_RESTORE_SETTLE_MS: u64 = 200;

/// Pointer updates per second while dragging
pub const DEFAULT_DRAG_STEPS_PER_SECOND: u32 = 60;

/// Screenshot files kept on disk before the oldest is deleted
pub const DEFAULT_MAX_SCREENSHOTS: usize = 100;

/// Settings shared by every automation operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Refuse input while the pointer is parked in a screen corner
    pub fail_safe:              bool,
    /// Pause after every input action, in milliseconds
    pub action_pause_ms:        u64,
    /// Wait after activating a window before capturing it
    pub activation_settle_ms:   u64,
    /// Wait after restoring the previously focused window
    pub restore_settle_ms:      u64,
    /// Pointer updates per second during `drag_mouse`
    pub drag_steps_per_second:  u32,
    /// Override for the user's downloads directory
    pub downloads_dir:          Option<PathBuf>,
    /// Override for the managed screenshot directory
    pub screenshot_dir:         Option<PathBuf>,
    /// Managed screenshot files kept before the oldest is pruned
    pub max_screenshots:        usize,
    /// OCR engine settings
    pub ocr:                    OcrConfig,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            fail_safe:             true,
            action_pause_ms:       0,
            activation_settle_ms:  DEFAULT_ACTIVATION_SETTLE_MS,
            restore_settle_ms:     DEFAULT_RESTORE_SETTLE_MS,
            drag_steps_per_second: DEFAULT_DRAG_STEPS_PER_SECOND,
            downloads_dir:         None,
            screenshot_dir:        None,
            max_screenshots:       DEFAULT_MAX_SCREENSHOTS,
            ocr:                   OcrConfig::default(),
        }
    }
}

impl DesktopConfig {
    /// Configuration for tests: no fail-safe and no settle delays
    pub fn immediate() -> Self {
        Self {
            fail_safe: false,
            activation_settle_ms: 0,
            restore_settle_ms: 0,
            ..Default::default()
        }
    }

    pub fn action_pause(&self) -> Duration {
        Duration::from_millis(self.action_pause_ms)
    }

    pub fn activation_settle(&self) -> Duration {
        Duration::from_millis(self.activation_settle_ms)
    }

    pub fn restore_settle(&self) -> Duration {
        Duration::from_millis(self.restore_settle_ms)
    }

    /// Checks value ranges that clap cannot express
    pub fn validate(&self) -> DesktopResult<()> {
        if self.drag_steps_per_second == 0 || self.drag_steps_per_second > 1000 {
            return Err(DesktopError::invalid(
                "drag_steps_per_second",
                format!("{} is outside 1..=1000", self.drag_steps_per_second),
            ));
        }
        if self.max_screenshots == 0 {
            return Err(DesktopError::invalid("max_screenshots", "must be at least 1"));
        }
        self.ocr.validate()
    }
}

/// Paths and tuning for the two-stage OCR pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Text detection (DBNet) ONNX model
    pub det_model:       Option<PathBuf>,
    /// Text recognition (CRNN) ONNX model
    pub rec_model:       Option<PathBuf>,
    /// Character dictionary, one entry per line
    pub dict:            Option<PathBuf>,
    /// ONNX Runtime shared library; falls back to `ORT_DYLIB_PATH`
    pub ort_dylib:       Option<PathBuf>,
    /// Threads per inference session
    pub intra_threads:   usize,
    /// Longest image side fed to the detector
    pub max_side_len:    u32,
    /// Probability above which a pixel counts as text
    pub det_threshold:   f32,
    /// Minimum mean probability of a kept text region
    pub box_threshold:   f32,
    /// Box expansion factor applied to detected regions
    pub unclip_ratio:    f32,
    /// Recognition input height in pixels
    pub rec_image_height: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            det_model:        None,
            rec_model:        None,
            dict:             None,
            ort_dylib:        None,
            intra_threads:    2,
            max_side_len:     960,
            det_threshold:    0.3,
            box_threshold:    0.5,
            unclip_ratio:     1.6,
            rec_image_height: 48,
        }
    }
}

impl OcrConfig {
    /// True when all three model files are configured
    pub fn is_configured(&self) -> bool {
        self.det_model.is_some() && self.rec_model.is_some() && self.dict.is_some()
    }

    pub fn validate(&self) -> DesktopResult<()> {
        if !(0.0..1.0).contains(&self.det_threshold) {
            return Err(DesktopError::invalid("det_threshold", "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.box_threshold) {
            return Err(DesktopError::invalid("box_threshold", "must be in [0, 1)"));
        }
        if !(1.0..=4.0).contains(&self.unclip_ratio) {
            return Err(DesktopError::invalid("unclip_ratio", "must be between 1.0 and 4.0"));
        }
        if self.max_side_len < 32 || self.max_side_len % 32 != 0 {
            return Err(DesktopError::invalid(
                "max_side_len",
                "must be a positive multiple of 32",
            ));
        }
        if self.rec_image_height == 0 {
            return Err(DesktopError::invalid("rec_image_height", "must be positive"));
        }
        Ok(())
    }
}
