use serde::{Deserialize, Serialize};

use crate::ClickButton;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Position list
    AddPosition,
    RemovePosition { index: usize },
    ClearPositions,
    CapturePosition,
    SetDelay { index: usize, delay: String },
    SetButton { index: usize, button: ClickButton },

    // Replay
    SetRepeat { count: String },
    ToggleReplay,
    StopReplay,

    // Hotkeys
    BindCapture { key: String },
    BindToggle { key: String },

    // Persistence
    Save { path: String },
    Load { path: String },
    SetAutoload { path: String },
    ClearAutoload,
    ListConfigs,

    // Queries
    ListPositions,
    GetState,

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Positions { positions: Vec<PositionInfo> },
    Captured { index: usize, x: i32, y: i32 },
    Replay { running: bool },
    Configs { configs: Vec<String> },
    State { state: StateInfo },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub index: usize,
    /// `None` while the slot has not been captured yet.
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Delay as the user entered it; may be non-numeric.
    pub delay: String,
    pub button: ClickButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub running: bool,
    pub position_count: usize,
    pub repeat: String,
    pub capture_key: String,
    pub toggle_key: String,
    pub autoload_path: Option<String>,
    pub macro_path: Option<String>,
    pub last_error: Option<String>,
}
