//! On-disk JSON documents.
//!
//! Field names are stable. Unknown fields are ignored and missing ones take
//! defaults, so older files keep loading. Legacy field names (`click`,
//! `setpos_key`, `autoload`) are accepted as aliases.

use renda_ipc::ClickButton;
use serde::{Deserialize, Serialize};

use crate::core::{
    parse_hotkey, Delay, HotkeyAction, HotkeyRegistry, MacroConfig, Point, Position, PositionList,
    Settings, DEFAULT_DELAY_MS,
};

/// An integer that may also have been stored as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LenientInt {
    Int(i64),
    Text(String),
}

impl LenientInt {
    fn as_i64(&self) -> Option<i64> {
        match self {
            LenientInt::Int(n) => Some(*n),
            LenientInt::Text(s) => s.trim().parse().ok(),
        }
    }

    fn to_delay(&self) -> Delay {
        match self {
            LenientInt::Int(n) => Delay::Millis(*n),
            LenientInt::Text(s) => Delay::parse(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<LenientInt>,
    #[serde(default, alias = "click", skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
}

impl PositionRecord {
    pub fn from_position(position: &Position) -> Self {
        Self {
            x: position.point.map(|p| p.x),
            y: position.point.map(|p| p.y),
            delay: Some(LenientInt::Int(position.delay.persisted_millis())),
            button: Some(position.button.as_str().to_string()),
        }
    }

    pub fn to_position(&self) -> Position {
        let point = match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };
        Position {
            point,
            delay: self
                .delay
                .as_ref()
                .map(LenientInt::to_delay)
                .unwrap_or(Delay::Millis(DEFAULT_DELAY_MS)),
            button: self
                .button
                .as_deref()
                .map(ClickButton::from_name_or_default)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDocument {
    #[serde(default)]
    pub positions: Vec<PositionRecord>,
    #[serde(default, alias = "setpos_key", skip_serializing_if = "Option::is_none")]
    pub capture_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<LenientInt>,
}

impl MacroDocument {
    pub fn from_config(config: &MacroConfig) -> Self {
        Self {
            positions: config
                .positions
                .iter()
                .map(PositionRecord::from_position)
                .collect(),
            capture_key: Some(config.hotkeys.key_string(HotkeyAction::Capture)),
            toggle_key: Some(config.hotkeys.key_string(HotkeyAction::Toggle)),
            repeat_count: Some(LenientInt::Int(i64::from(config.repeat_count))),
        }
    }

    /// Hotkeys missing from the document, or not parsable, stay as in `current`.
    pub fn into_config(self, current: &HotkeyRegistry) -> MacroConfig {
        let positions =
            PositionList::from_positions(self.positions.iter().map(|r| r.to_position()).collect());

        let capture = document_key(HotkeyAction::Capture, self.capture_key.as_deref(), current);
        let toggle = document_key(HotkeyAction::Toggle, self.toggle_key.as_deref(), current);
        let hotkeys = match HotkeyRegistry::new(&capture, &toggle) {
            Ok(hotkeys) => hotkeys,
            Err(e) => {
                tracing::warn!("Ignoring hotkeys {:?}/{:?} from document: {}", capture, toggle, e);
                current.clone()
            }
        };

        let repeat_count = match &self.repeat_count {
            None => 0,
            Some(value) => match value.as_i64().and_then(|n| u32::try_from(n).ok()) {
                Some(n) => n,
                None => {
                    tracing::warn!("Ignoring invalid repeat_count {:?}, using 0", value);
                    0
                }
            },
        };

        MacroConfig {
            positions,
            hotkeys,
            repeat_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default, alias = "autoload", skip_serializing_if = "Option::is_none")]
    pub autoload_path: Option<String>,
}

impl SettingsDocument {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            autoload_path: settings.autoload_path.clone(),
        }
    }

    pub fn into_settings(self) -> Settings {
        Settings {
            autoload_path: self.autoload_path.filter(|p| !p.trim().is_empty()),
        }
    }
}

/// The document's key for `action` if it parses, else the current one.
fn document_key(action: HotkeyAction, key: Option<&str>, current: &HotkeyRegistry) -> String {
    match key.map(|k| (k, parse_hotkey(k))) {
        Some((key, Ok(_))) => key.to_string(),
        Some((key, Err(e))) => {
            tracing::warn!("Ignoring {} hotkey {:?} from document: {}", action, key, e);
            current.key_string(action)
        }
        None => current.key_string(action),
    }
}
