//! Synthetic input through enigo
//!
//! enigo connections are not `Send` on every platform, so each call opens a
//! short-lived connection on the blocking thread pool. A chord runs inside
//! one connection so its modifiers stay held until the final key is down.

use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, InputError, Keyboard, Mouse, Settings};

use super::InputController;
use crate::{
    error::{DesktopError, DesktopResult},
    keys::Key,
    model::{MouseButton, Point, PressAction, ScreenSize},
};

/// Native mouse and keyboard backend
#[derive(Debug, Default, Clone)]
pub struct EnigoInput;

impl EnigoInput {
    pub fn new() -> Self {
        Self
    }

    /// Settings for every input connection
    ///
    /// enigo releases held keys when a connection drops by default, which
    /// would undo a press issued in an earlier call.
    fn settings() -> Settings {
        Settings {
            release_keys_when_dropped: false,
            ..Default::default()
        }
    }

    async fn run<T, F>(action: &'static str, f: F) -> DesktopResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Enigo) -> Result<T, DesktopError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut enigo = Enigo::new(&Self::settings()).map_err(|e| {
                tracing::error!("Failed to open input connection: {}", e);
                DesktopError::input(action, e)
            })?;
            f(&mut enigo)
        })
        .await
        .map_err(|e| {
            tracing::error!("Input task for {} panicked: {}", action, e);
            DesktopError::input(action, e)
        })?
    }
}

fn failed(action: &'static str) -> impl Fn(InputError) -> DesktopError {
    move |e| DesktopError::input(action, e)
}

fn to_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

fn to_direction(action: PressAction) -> Direction {
    match action {
        PressAction::Press => Direction::Press,
        PressAction::Release => Direction::Release,
        PressAction::Click => Direction::Click,
    }
}

/// Maps a key name to the enigo key for the current platform
pub fn to_enigo_key(key: Key) -> DesktopResult<enigo::Key> {
    use enigo::Key as K;

    let mapped = match key {
        Key::Enter => K::Return,
        Key::Tab => K::Tab,
        Key::Escape => K::Escape,
        Key::Space => K::Space,
        Key::Backspace => K::Backspace,
        Key::Delete => K::Delete,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Shift => K::Shift,
        Key::Control => K::Control,
        Key::Alt => K::Alt,
        Key::Meta => K::Meta,
        Key::CapsLock => K::CapsLock,
        Key::Char(c) => K::Unicode(c),
        Key::F(n) => match n {
            1 => K::F1,
            2 => K::F2,
            3 => K::F3,
            4 => K::F4,
            5 => K::F5,
            6 => K::F6,
            7 => K::F7,
            8 => K::F8,
            9 => K::F9,
            10 => K::F10,
            11 => K::F11,
            12 => K::F12,
            _ => {
                return Err(DesktopError::UnknownKey {
                    key: key.to_string(),
                });
            }
        },
        #[cfg(not(target_os = "macos"))]
        Key::Insert => K::Insert,
        #[cfg(not(target_os = "macos"))]
        Key::PrintScreen => K::PrintScr,
        #[cfg(target_os = "macos")]
        Key::Insert | Key::PrintScreen => {
            return Err(DesktopError::NotSupported {
                feature: format!("key '{}'", key),
                backend: crate::model::BackendType::MacOS,
            });
        }
    };
    Ok(mapped)
}

#[async_trait]
impl InputController for EnigoInput {
    async fn move_mouse(&self, to: Point) -> DesktopResult<()> {
        Self::run("move_mouse", move |enigo| {
            enigo
                .move_mouse(to.x, to.y, Coordinate::Abs)
                .map_err(failed("move_mouse"))
        })
        .await
    }

    async fn mouse_button(&self, button: MouseButton, action: PressAction) -> DesktopResult<()> {
        Self::run("mouse_button", move |enigo| {
            enigo
                .button(to_button(button), to_direction(action))
                .map_err(failed("mouse_button"))
        })
        .await
    }

    async fn click(&self, button: MouseButton, count: u32) -> DesktopResult<()> {
        Self::run("click", move |enigo| {
            for _ in 0..count {
                enigo
                    .button(to_button(button), Direction::Click)
                    .map_err(failed("click"))?;
            }
            Ok(())
        })
        .await
    }

    async fn type_text(&self, text: &str) -> DesktopResult<()> {
        let text = text.to_string();
        Self::run("type_text", move |enigo| enigo.text(&text).map_err(failed("type_text"))).await
    }

    async fn key(&self, key: Key, action: PressAction) -> DesktopResult<()> {
        let mapped = to_enigo_key(key)?;
        Self::run("press_key", move |enigo| {
            enigo
                .key(mapped, to_direction(action))
                .map_err(failed("press_key"))
        })
        .await
    }

    async fn key_chord(&self, keys: &[Key]) -> DesktopResult<()> {
        let mapped = keys
            .iter()
            .map(|key| to_enigo_key(*key))
            .collect::<DesktopResult<Vec<_>>>()?;

        Self::run("press_key", move |enigo| {
            let mut held = Vec::with_capacity(mapped.len());
            let mut result = Ok(());
            for key in &mapped {
                if let Err(e) = enigo.key(*key, Direction::Press) {
                    result = Err(DesktopError::input("press_key", e));
                    break;
                }
                held.push(*key);
            }

            for key in held.into_iter().rev() {
                if let Err(e) = enigo.key(key, Direction::Release) {
                    tracing::warn!("Failed to release {:?}: {}", key, e);
                    if result.is_ok() {
                        result = Err(DesktopError::input("press_key", e));
                    }
                }
            }
            result
        })
        .await
    }

    async fn cursor_position(&self) -> DesktopResult<Point> {
        Self::run("cursor_position", |enigo| {
            let (x, y) = enigo.location().map_err(failed("cursor_position"))?;
            Ok(Point::new(x, y))
        })
        .await
    }

    async fn screen_size(&self) -> DesktopResult<ScreenSize> {
        Self::run("screen_size", |enigo| {
            let (width, height) = enigo.main_display().map_err(failed("screen_size"))?;
            Ok(ScreenSize::new(width.max(0) as u32, height.max(0) as u32))
        })
        .await
    }
}
