//! Desktop backends: input, capture and window management
//!
//! # Architecture
//!
//! Each concern is a capability trait and a [`DesktopBackend`] bundles one
//! implementation of each:
//!
//! - [`InputController`] - synthetic mouse and keyboard (enigo)
//! - [`ScreenCapture`] - screen and region capture (xcap)
//! - [`WindowManager`] - window enumeration (xcap) and activation (x11rb,
//!   windows-sys)
//!
//! | Backend | Input | Capture | Windows | OCR |
//! |---------|-------|---------|---------|-----|
//! | native  | enigo | xcap    | xcap + EWMH / Win32 | ONNX Runtime (lazy) |
//! | mock    | ✓     | ✓       | ✓       | canned boxes |
//!
//! Use [`create_default_backend()`] in binaries and [`composite_from_mock()`]
//! in tests.

use std::sync::Arc;

#[cfg(feature = "native")]
pub mod activation;
pub mod composite;
#[cfg(feature = "native")]
pub mod enigo_input;
pub mod image_buffer;
pub mod matching;
pub mod mock;
pub mod traits;
#[cfg(feature = "native")]
pub mod xcap_backend;

pub use composite::{DesktopBackend, composite_from_mock};
#[cfg(feature = "native")]
pub use composite::composite_from_native;
#[cfg(feature = "native")]
pub use enigo_input::EnigoInput;
pub use image_buffer::ImageBuffer;
pub use matching::WindowMatcher;
pub use mock::{MockBackend, MockEvent};
pub use traits::{InputController, RegionCapture, ScreenCapture, WindowManager};
#[cfg(feature = "native")]
pub use xcap_backend::XcapBackend;

use crate::{
    config::DesktopConfig,
    error::{DesktopError, DesktopResult},
    util::detect::{detect_platform, supports_automation},
};

/// Creates the native backend for the current session
///
/// Fails with `BackendNotAvailable` when no X11 or Windows desktop is
/// reachable (pure Wayland, headless) or when the crate was built without
/// the `native` feature.
pub fn create_default_backend(config: &DesktopConfig) -> DesktopResult<Arc<DesktopBackend>> {
    let platform = detect_platform();
    tracing::info!("Detected platform: {} ({})", platform.os, platform.backend);

    if !supports_automation(platform.backend) {
        return Err(DesktopError::BackendNotAvailable {
            backend: platform.backend,
        });
    }

    #[cfg(feature = "native")]
    {
        Ok(Arc::new(composite_from_native(config, platform)))
    }

    #[cfg(not(feature = "native"))]
    {
        let _ = config;
        Err(DesktopError::BackendNotAvailable {
            backend: platform.backend,
        })
    }
}
