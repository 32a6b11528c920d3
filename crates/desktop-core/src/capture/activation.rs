//! Bringing a window to the foreground
//!
//! - **X11**: EWMH `_NET_ACTIVE_WINDOW` client message to the root window
//!   (source indication 1, as a normal application would send).
//! - **Windows**: restore if minimized, then `SetForegroundWindow`.
//!
//! Both calls are blocking and run on the blocking thread pool.

use crate::error::{DesktopError, DesktopResult};

fn activation_error(id: u32, reason: impl std::fmt::Display) -> DesktopError {
    DesktopError::WindowActivationFailed {
        title:  id.to_string(),
        reason: reason.to_string(),
    }
}

/// Activates the window with the given native id
#[cfg(target_os = "linux")]
pub fn activate_window(id: u32) -> DesktopResult<()> {
    use x11rb::{
        CURRENT_TIME,
        connection::Connection as _,
        protocol::xproto::{ClientMessageEvent, ConnectionExt as _, EventMask},
    };

    let (conn, screen_idx) = x11rb::connect(None).map_err(|e| {
        tracing::error!("Failed to connect to X11 for activation: {}", e);
        DesktopError::BackendNotAvailable {
            backend: crate::model::BackendType::X11,
        }
    })?;

    let root = conn
        .setup()
        .roots
        .get(screen_idx)
        .map(|screen| screen.root)
        .ok_or_else(|| activation_error(id, format!("X11 screen {} does not exist", screen_idx)))?;

    let net_active_window = conn
        .intern_atom(false, b"_NET_ACTIVE_WINDOW")
        .map_err(|e| activation_error(id, e))?
        .reply()
        .map_err(|e| activation_error(id, e))?
        .atom;

    let event = ClientMessageEvent::new(32, id, net_active_window, [1, CURRENT_TIME, 0, 0, 0]);
    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        event,
    )
    .map_err(|e| activation_error(id, e))?;
    conn.flush().map_err(|e| activation_error(id, e))?;

    tracing::debug!("Sent _NET_ACTIVE_WINDOW for window {}", id);
    Ok(())
}

/// Activates the window with the given native id
#[cfg(target_os = "windows")]
pub fn activate_window(id: u32) -> DesktopResult<()> {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        IsIconic, SW_RESTORE, SetForegroundWindow, ShowWindow,
    };

    let hwnd = id as usize as windows_sys::Win32::Foundation::HWND;

    // SAFETY: the handle comes from window enumeration; both calls tolerate
    // stale handles by returning 0.
    let activated = unsafe {
        if IsIconic(hwnd) != 0 {
            ShowWindow(hwnd, SW_RESTORE);
        }
        SetForegroundWindow(hwnd)
    };

    if activated == 0 {
        return Err(activation_error(id, "SetForegroundWindow was refused"));
    }
    tracing::debug!("Activated window {:#x}", id);
    Ok(())
}

/// Activates the window with the given native id
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub fn activate_window(_id: u32) -> DesktopResult<()> {
    Err(DesktopError::NotSupported {
        feature: "window activation".to_string(),
        backend: crate::util::detect::detect_platform().backend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_error_carries_id() {
        let error = activation_error(0x1c00007, "refused");
        assert!(error.to_string().contains("29360135"));
        assert!(error.to_string().contains("refused"));
    }
}
