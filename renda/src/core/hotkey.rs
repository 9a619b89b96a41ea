use std::fmt;

use renda_ipc::Command;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyError {
    #[error("Empty key string")]
    Empty,
    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("{key} is already bound to {action}")]
    Conflict { key: String, action: HotkeyAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub cmd: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

/// What a global hotkey does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    Capture,
    Toggle,
}

impl HotkeyAction {
    pub fn to_command(self) -> Command {
        match self {
            HotkeyAction::Capture => Command::CapturePosition,
            HotkeyAction::Toggle => Command::ToggleReplay,
        }
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyAction::Capture => f.write_str("capture"),
            HotkeyAction::Toggle => f.write_str("toggle"),
        }
    }
}

pub fn parse_hotkey(key_str: &str) -> Result<Hotkey, HotkeyError> {
    let key_str = key_str.trim();
    if key_str.is_empty() {
        return Err(HotkeyError::Empty);
    }

    let parts: Vec<&str> = key_str.split(['-', '+']).collect();
    let Some((key_part, modifier_parts)) = parts.split_last() else {
        return Err(HotkeyError::Empty);
    };

    let mut modifiers = Modifiers::default();
    for part in modifier_parts {
        match part.to_lowercase().as_str() {
            "cmd" | "super" | "command" => modifiers.cmd = true,
            "alt" | "opt" | "option" => modifiers.alt = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            _ => return Err(HotkeyError::UnknownModifier(part.to_string())),
        }
    }

    let key_code = parse_key_code(key_part)?;

    Ok(Hotkey {
        key_code,
        modifiers,
    })
}

pub fn format_hotkey(hotkey: &Hotkey) -> String {
    let mut parts = Vec::new();
    if hotkey.modifiers.cmd {
        parts.push("cmd");
    }
    if hotkey.modifiers.alt {
        parts.push("alt");
    }
    if hotkey.modifiers.ctrl {
        parts.push("ctrl");
    }
    if hotkey.modifiers.shift {
        parts.push("shift");
    }
    parts.push(key_code_to_str(hotkey.key_code));
    parts.join("-")
}

/// The two global bindings of a session.
///
/// Owned by the session and handed to the platform listener, which installs
/// whatever is registered here and re-installs it after every rebind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyRegistry {
    capture: Hotkey,
    toggle: Hotkey,
}

impl HotkeyRegistry {
    pub fn new(capture_key: &str, toggle_key: &str) -> Result<Self, HotkeyError> {
        let capture = parse_hotkey(capture_key)?;
        let toggle = parse_hotkey(toggle_key)?;
        if capture == toggle {
            return Err(HotkeyError::Conflict {
                key: format_hotkey(&toggle),
                action: HotkeyAction::Capture,
            });
        }
        Ok(Self { capture, toggle })
    }

    pub fn bind(&mut self, action: HotkeyAction, key_str: &str) -> Result<(), HotkeyError> {
        let hotkey = parse_hotkey(key_str)?;
        let other = match action {
            HotkeyAction::Capture => HotkeyAction::Toggle,
            HotkeyAction::Toggle => HotkeyAction::Capture,
        };
        if self.hotkey(other) == hotkey {
            return Err(HotkeyError::Conflict {
                key: format_hotkey(&hotkey),
                action: other,
            });
        }

        match action {
            HotkeyAction::Capture => self.capture = hotkey,
            HotkeyAction::Toggle => self.toggle = hotkey,
        }
        tracing::info!("Bound {} to {}", format_hotkey(&hotkey), action);
        Ok(())
    }

    pub fn hotkey(&self, action: HotkeyAction) -> Hotkey {
        match action {
            HotkeyAction::Capture => self.capture,
            HotkeyAction::Toggle => self.toggle,
        }
    }

    pub fn key_string(&self, action: HotkeyAction) -> String {
        format_hotkey(&self.hotkey(action))
    }

    pub fn action_for(&self, hotkey: &Hotkey) -> Option<HotkeyAction> {
        if *hotkey == self.capture {
            Some(HotkeyAction::Capture)
        } else if *hotkey == self.toggle {
            Some(HotkeyAction::Toggle)
        } else {
            None
        }
    }
}

/// `f5` captures, `f6` toggles.
impl Default for HotkeyRegistry {
    fn default() -> Self {
        Self {
            capture: Hotkey {
                key_code: 0x60,
                modifiers: Modifiers::default(),
            },
            toggle: Hotkey {
                key_code: 0x61,
                modifiers: Modifiers::default(),
            },
        }
    }
}

// Virtual key codes as reported by the macOS keyboard event field.
fn parse_key_code(key: &str) -> Result<u16, HotkeyError> {
    match key.to_lowercase().as_str() {
        // Letters
        "a" => Ok(0x00),
        "b" => Ok(0x0B),
        "c" => Ok(0x08),
        "d" => Ok(0x02),
        "e" => Ok(0x0E),
        "f" => Ok(0x03),
        "g" => Ok(0x05),
        "h" => Ok(0x04),
        "i" => Ok(0x22),
        "j" => Ok(0x26),
        "k" => Ok(0x28),
        "l" => Ok(0x25),
        "m" => Ok(0x2E),
        "n" => Ok(0x2D),
        "o" => Ok(0x1F),
        "p" => Ok(0x23),
        "q" => Ok(0x0C),
        "r" => Ok(0x0F),
        "s" => Ok(0x01),
        "t" => Ok(0x11),
        "u" => Ok(0x20),
        "v" => Ok(0x09),
        "w" => Ok(0x0D),
        "x" => Ok(0x07),
        "y" => Ok(0x10),
        "z" => Ok(0x06),
        // Numbers
        "1" => Ok(0x12),
        "2" => Ok(0x13),
        "3" => Ok(0x14),
        "4" => Ok(0x15),
        "5" => Ok(0x17),
        "6" => Ok(0x16),
        "7" => Ok(0x1A),
        "8" => Ok(0x1C),
        "9" => Ok(0x19),
        "0" => Ok(0x1D),
        // Special keys
        "return" | "enter" => Ok(0x24),
        "tab" => Ok(0x30),
        "space" => Ok(0x31),
        "delete" | "backspace" => Ok(0x33),
        "escape" | "esc" => Ok(0x35),
        "home" => Ok(0x73),
        "end" => Ok(0x77),
        "pageup" => Ok(0x74),
        "pagedown" => Ok(0x79),
        "left" => Ok(0x7B),
        "right" => Ok(0x7C),
        "down" => Ok(0x7D),
        "up" => Ok(0x7E),
        "f1" => Ok(0x7A),
        "f2" => Ok(0x78),
        "f3" => Ok(0x63),
        "f4" => Ok(0x76),
        "f5" => Ok(0x60),
        "f6" => Ok(0x61),
        "f7" => Ok(0x62),
        "f8" => Ok(0x64),
        "f9" => Ok(0x65),
        "f10" => Ok(0x6D),
        "f11" => Ok(0x67),
        "f12" => Ok(0x6F),
        // Punctuation
        "minus" => Ok(0x1B),
        "equal" => Ok(0x18),
        "leftbracket" => Ok(0x21),
        "rightbracket" => Ok(0x1E),
        "backslash" => Ok(0x2A),
        "semicolon" => Ok(0x29),
        "quote" => Ok(0x27),
        "comma" => Ok(0x2B),
        "period" => Ok(0x2F),
        "slash" => Ok(0x2C),
        "grave" => Ok(0x32),
        _ => Err(HotkeyError::UnknownKey(key.to_string())),
    }
}

fn key_code_to_str(code: u16) -> &'static str {
    match code {
        0x00 => "a",
        0x0B => "b",
        0x08 => "c",
        0x02 => "d",
        0x0E => "e",
        0x03 => "f",
        0x05 => "g",
        0x04 => "h",
        0x22 => "i",
        0x26 => "j",
        0x28 => "k",
        0x25 => "l",
        0x2E => "m",
        0x2D => "n",
        0x1F => "o",
        0x23 => "p",
        0x0C => "q",
        0x0F => "r",
        0x01 => "s",
        0x11 => "t",
        0x20 => "u",
        0x09 => "v",
        0x0D => "w",
        0x07 => "x",
        0x10 => "y",
        0x06 => "z",
        0x12 => "1",
        0x13 => "2",
        0x14 => "3",
        0x15 => "4",
        0x17 => "5",
        0x16 => "6",
        0x1A => "7",
        0x1C => "8",
        0x19 => "9",
        0x1D => "0",
        0x24 => "return",
        0x30 => "tab",
        0x31 => "space",
        0x33 => "delete",
        0x35 => "escape",
        0x73 => "home",
        0x77 => "end",
        0x74 => "pageup",
        0x79 => "pagedown",
        0x7B => "left",
        0x7C => "right",
        0x7D => "down",
        0x7E => "up",
        0x7A => "f1",
        0x78 => "f2",
        0x63 => "f3",
        0x76 => "f4",
        0x60 => "f5",
        0x61 => "f6",
        0x62 => "f7",
        0x64 => "f8",
        0x65 => "f9",
        0x6D => "f10",
        0x67 => "f11",
        0x6F => "f12",
        0x1B => "minus",
        0x18 => "equal",
        0x21 => "leftbracket",
        0x1E => "rightbracket",
        0x2A => "backslash",
        0x29 => "semicolon",
        0x27 => "quote",
        0x2B => "comma",
        0x2F => "period",
        0x2C => "slash",
        0x32 => "grave",
        _ => "unknown",
    }
}
