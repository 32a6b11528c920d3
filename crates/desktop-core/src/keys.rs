//! Key names accepted by the `press_key` tool
//!
//! Names follow the pyautogui vocabulary that agents already know
//! (`enter`, `esc`, `pgdn`, `win`, ...). Any single character is accepted as
//! a literal key. Chords join keys with `+`, e.g. `ctrl+shift+t`.

use std::{fmt, str::FromStr};

use crate::error::DesktopError;

/// A single named or literal key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Space,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key F1-F12
    F(u8),
    Shift,
    Control,
    Alt,
    /// Windows / Super / Command key
    Meta,
    CapsLock,
    PrintScreen,
    /// Literal character
    Char(char),
}

impl Key {
    /// Modifier keys stay held while the rest of a chord is pressed
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

impl FromStr for Key {
    type Err = DesktopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }

        let name = s.trim().to_ascii_lowercase();
        let key = match name.as_str() {
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "space" | "spacebar" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "insert" | "ins" => Key::Insert,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "shift" | "shiftleft" | "shiftright" => Key::Shift,
            "ctrl" | "control" | "ctrlleft" | "ctrlright" => Key::Control,
            "alt" | "altleft" | "altright" | "option" => Key::Alt,
            "win" | "winleft" | "winright" | "super" | "meta" | "command" | "cmd" => Key::Meta,
            "capslock" => Key::CapsLock,
            "printscreen" | "prtsc" | "prntscrn" | "print" => Key::PrintScreen,
            other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => Key::F(n),
                _ => {
                    return Err(DesktopError::UnknownKey {
                        key: s.to_string(),
                    });
                }
            },
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::F(n) => return write!(f, "f{}", n),
            Key::Char(c) => return write!(f, "{}", c),
            Key::Enter => "enter",
            Key::Tab => "tab",
            Key::Escape => "esc",
            Key::Space => "space",
            Key::Backspace => "backspace",
            Key::Delete => "delete",
            Key::Insert => "insert",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "pageup",
            Key::PageDown => "pagedown",
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
            Key::Shift => "shift",
            Key::Control => "ctrl",
            Key::Alt => "alt",
            Key::Meta => "win",
            Key::CapsLock => "capslock",
            Key::PrintScreen => "printscreen",
        };
        f.write_str(name)
    }
}

/// Ordered key combination such as `ctrl+c`
///
/// Keys are pressed in order and released in reverse order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    keys: Vec<Key>,
}

impl KeyChord {
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// True for a single key without modifiers
    pub fn is_single(&self) -> bool {
        self.keys.len() == 1
    }
}

impl FromStr for KeyChord {
    type Err = DesktopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DesktopError::InvalidParameter {
                parameter: "key".to_string(),
                reason:    "Key must not be empty".to_string(),
            });
        }

        // A bare "+" or a trailing "++" means the plus key itself
        if s == "+" {
            return Ok(Self {
                keys: vec![Key::Char('+')],
            });
        }
        let (body, trailing_plus) = match s.strip_suffix("++") {
            Some(body) => (body, true),
            None => (s, false),
        };

        let mut keys = body
            .split('+')
            .map(|part| {
                if part.trim().is_empty() {
                    Err(DesktopError::UnknownKey { key: s.to_string() })
                } else if part.chars().count() == 1 {
                    part.parse()
                } else {
                    part.trim().parse()
                }
            })
            .collect::<Result<Vec<Key>, _>>()?;

        if trailing_plus {
            keys.push(Key::Char('+'));
        }

        Ok(Self { keys })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        f.write_str(&names.join("+"))
    }
}
