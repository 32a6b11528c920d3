//! Command-line flags for the `desktop-control-mcp` binary
//!
//! Every flag can also be set through a `DESKTOP_MCP_*` environment
//! variable, which is how MCP client configs usually pass settings.

use std::path::PathBuf;

use clap::Parser;
use desktop_core::config::{
    DEFAULT_ACTIVATION_SETTLE_MS, DEFAULT_DRAG_STEPS_PER_SECOND, DEFAULT_MAX_SCREENSHOTS,
    DEFAULT_RESTORE_SETTLE_MS, DesktopConfig, OcrConfig,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "desktop-control-mcp", version)]
#[command(about = "MCP server for mouse, keyboard, screenshot, OCR and window control")]
pub struct ServerArgs {
    /// Serve an in-memory mock desktop instead of the real one
    #[arg(long, env = "DESKTOP_MCP_MOCK")]
    pub mock: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "DESKTOP_MCP_LOG_JSON")]
    pub log_json: bool,

    /// Allow input while the pointer sits in a screen corner
    #[arg(long, env = "DESKTOP_MCP_DISABLE_FAIL_SAFE")]
    pub disable_fail_safe: bool,

    /// Pause after every input action, in milliseconds
    #[arg(long, env = "DESKTOP_MCP_ACTION_PAUSE_MS", default_value_t = 0)]
    pub action_pause_ms: u64,

    /// Wait after activating a window before capturing it
    #[arg(long, env = "DESKTOP_MCP_ACTIVATION_SETTLE_MS", default_value_t = DEFAULT_ACTIVATION_SETTLE_MS)]
    pub activation_settle_ms: u64,

    /// Wait after giving focus back to the previous window
    #[arg(long, env = "DESKTOP_MCP_RESTORE_SETTLE_MS", default_value_t = DEFAULT_RESTORE_SETTLE_MS)]
    pub restore_settle_ms: u64,

    /// Pointer updates per second while dragging
    #[arg(long, env = "DESKTOP_MCP_DRAG_STEPS_PER_SECOND", default_value_t = DEFAULT_DRAG_STEPS_PER_SECOND)]
    pub drag_steps_per_second: u32,

    /// Directory used by save_to_downloads instead of the user's Downloads
    #[arg(long, env = "DESKTOP_MCP_DOWNLOADS_DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Directory for managed screenshot files
    #[arg(long, env = "DESKTOP_MCP_SCREENSHOT_DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Screenshot files kept before the oldest is deleted
    #[arg(long, env = "DESKTOP_MCP_MAX_SCREENSHOTS", default_value_t = DEFAULT_MAX_SCREENSHOTS)]
    pub max_screenshots: usize,

    /// Text detection model (PaddleOCR DB, ONNX)
    #[arg(long, env = "DESKTOP_MCP_OCR_DET_MODEL")]
    pub ocr_det_model: Option<PathBuf>,

    /// Text recognition model (PaddleOCR CRNN, ONNX)
    #[arg(long, env = "DESKTOP_MCP_OCR_REC_MODEL")]
    pub ocr_rec_model: Option<PathBuf>,

    /// Character dictionary for the recognition model
    #[arg(long, env = "DESKTOP_MCP_OCR_DICT")]
    pub ocr_dict: Option<PathBuf>,

    /// ONNX Runtime shared library
    #[arg(long, env = "DESKTOP_MCP_ORT_DYLIB")]
    pub ort_dylib: Option<PathBuf>,

    /// Threads per OCR inference session
    #[arg(long, env = "DESKTOP_MCP_OCR_THREADS", default_value_t = 2)]
    pub ocr_threads: usize,
}

impl ServerArgs {
    /// Builds the controller configuration from the parsed flags
    pub fn to_config(&self) -> DesktopConfig {
        DesktopConfig {
            fail_safe: !self.disable_fail_safe,
            action_pause_ms: self.action_pause_ms,
            activation_settle_ms: self.activation_settle_ms,
            restore_settle_ms: self.restore_settle_ms,
            drag_steps_per_second: self.drag_steps_per_second,
            downloads_dir: self.downloads_dir.clone(),
            screenshot_dir: self.screenshot_dir.clone(),
            max_screenshots: self.max_screenshots,
            ocr: OcrConfig {
                det_model: self.ocr_det_model.clone(),
                rec_model: self.ocr_rec_model.clone(),
                dict: self.ocr_dict.clone(),
                ort_dylib: self.ort_dylib.clone(),
                intra_threads: self.ocr_threads,
                ..Default::default()
            },
        }
    }
}
