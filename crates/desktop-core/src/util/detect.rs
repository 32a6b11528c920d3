//! Display session detection
//!
//! Synthetic input and window enumeration go through X11 or Win32. A Wayland
//! session is only usable when XWayland exposes a `DISPLAY`, so detection
//! prefers X11 whenever both variables are set.

use std::env;

use crate::model::{BackendType, PlatformInfo};

/// Detects the current operating system and display backend
///
/// # Examples
///
/// ```
/// use desktop_core::util::detect::detect_platform;
///
/// let platform = detect_platform();
/// println!("Running on {} ({})", platform.os, platform.backend);
/// ```
pub fn detect_platform() -> PlatformInfo {
    detect_platform_with_env(|key| env::var(key).ok())
}

/// Returns true when the native backend can drive this session
pub fn supports_automation(backend: BackendType) -> bool {
    matches!(backend, BackendType::X11 | BackendType::Windows | BackendType::MacOS)
}

fn detect_platform_with_env<F>(_env_provider: F) -> PlatformInfo
where
    F: Fn(&str) -> Option<String>,
{
    #[cfg(target_os = "linux")]
    {
        PlatformInfo::new("linux".to_string(), detect_linux_backend(&_env_provider))
    }

    #[cfg(target_os = "windows")]
    {
        PlatformInfo::new("windows".to_string(), BackendType::Windows)
    }

    #[cfg(target_os = "macos")]
    {
        PlatformInfo::new("macos".to_string(), BackendType::MacOS)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        PlatformInfo::new("unknown".to_string(), BackendType::None)
    }
}

#[cfg(target_os = "linux")]
fn detect_linux_backend<F>(env_provider: &F) -> BackendType
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |key: &str| env_provider(key).is_some_and(|value| !value.is_empty());

    // XWayland sessions set both; the X11 path works there
    if is_set("DISPLAY") {
        return BackendType::X11;
    }
    if is_set("WAYLAND_DISPLAY") {
        return BackendType::Wayland;
    }
    BackendType::None
}
