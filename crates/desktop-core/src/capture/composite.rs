//! Backend facade holding one trait object per capability
//!
//! ```rust,ignore
//! use desktop_core::capture::create_default_backend;
//!
//! let backend = create_default_backend(&config)?;
//! let windows = backend.windows.list_windows().await?;
//! let image = backend.capture.capture_screen().await?;
//! ```

use std::sync::Arc;

use super::{InputController, MockBackend, ScreenCapture, WindowManager};
use crate::{
    error::{DesktopError, DesktopResult},
    model::PlatformInfo,
    ocr::TextRecognizer,
};

/// Capability bundle the automation layer runs against
pub struct DesktopBackend {
    pub input:    Arc<dyn InputController>,
    pub capture:  Arc<dyn ScreenCapture>,
    pub windows:  Arc<dyn WindowManager>,
    /// Absent when the crate is built without OCR support
    pub ocr:      Option<Arc<dyn TextRecognizer>>,
    /// Platform the backend was created for
    pub platform: PlatformInfo,
    /// Backend name for diagnostics ("native", "mock")
    pub name:     &'static str,
}

impl DesktopBackend {
    pub fn new(
        input: Arc<dyn InputController>,
        capture: Arc<dyn ScreenCapture>,
        windows: Arc<dyn WindowManager>,
        ocr: Option<Arc<dyn TextRecognizer>>,
        platform: PlatformInfo,
        name: &'static str,
    ) -> Self {
        Self {
            input,
            capture,
            windows,
            ocr,
            platform,
            name,
        }
    }

    /// The text recognizer, or `OcrUnavailable` when none is wired
    pub fn recognizer(&self) -> DesktopResult<&Arc<dyn TextRecognizer>> {
        self.ocr.as_ref().ok_or_else(|| DesktopError::OcrUnavailable {
            reason: "this build does not include OCR support".to_string(),
        })
    }
}

impl std::fmt::Debug for DesktopBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopBackend")
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("has_ocr", &self.ocr.is_some())
            .finish()
    }
}

/// Wires every capability to the same mock
pub fn composite_from_mock(backend: Arc<MockBackend>) -> DesktopBackend {
    DesktopBackend::new(
        backend.clone() as Arc<dyn InputController>,
        backend.clone() as Arc<dyn ScreenCapture>,
        backend.clone() as Arc<dyn WindowManager>,
        Some(backend as Arc<dyn TextRecognizer>),
        crate::util::detect::detect_platform(),
        "mock",
    )
}

/// Wires enigo input, xcap capture and window management, and lazy OCR
#[cfg(feature = "native")]
pub fn composite_from_native(
    config: &crate::config::DesktopConfig,
    platform: PlatformInfo,
) -> DesktopBackend {
    let windows = Arc::new(super::XcapBackend::new());

    #[cfg(feature = "ocr")]
    let ocr = Some(Arc::new(crate::ocr::LazyRecognizer::new(config.ocr.clone())) as Arc<dyn TextRecognizer>);
    #[cfg(not(feature = "ocr"))]
    let ocr = {
        let _ = config;
        None
    };

    DesktopBackend::new(
        Arc::new(super::EnigoInput::new()),
        windows.clone() as Arc<dyn ScreenCapture>,
        windows as Arc<dyn WindowManager>,
        ocr,
        platform,
        "native",
    )
}
