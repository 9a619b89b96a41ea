use std::path::PathBuf;

use renda_ipc::StateInfo;

use super::{HotkeyAction, HotkeyRegistry, MacroConfig, PositionList, Settings, SharedPositions};
use crate::replay::{RepeatLimit, ReplayError};

pub struct Session {
    pub positions: SharedPositions,
    pub hotkeys: HotkeyRegistry,
    /// Repeat count as typed; validated when a run starts or on save.
    pub repeat_input: String,
    pub settings: Settings,
    pub macro_path: Option<PathBuf>,
    pub last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            positions: PositionList::new().into_shared(),
            hotkeys: HotkeyRegistry::default(),
            repeat_input: "0".to_string(),
            settings: Settings::default(),
            macro_path: None,
            last_error: None,
        }
    }

    pub fn repeat_limit(&self) -> Result<RepeatLimit, ReplayError> {
        RepeatLimit::parse(&self.repeat_input)
    }

    /// Snapshot of everything a macro document stores.
    pub fn to_config(&self) -> Result<MacroConfig, ReplayError> {
        let repeat_count = self.repeat_limit()?.count();
        Ok(MacroConfig {
            positions: self.positions.lock().clone(),
            hotkeys: self.hotkeys.clone(),
            repeat_count,
        })
    }

    /// Replaces the list in place so a running replay keeps its handle.
    pub fn apply_config(&mut self, config: MacroConfig, path: Option<PathBuf>) {
        *self.positions.lock() = config.positions;
        self.hotkeys = config.hotkeys;
        self.repeat_input = config.repeat_count.to_string();
        self.macro_path = path;
    }

    pub fn state_info(&self, running: bool) -> StateInfo {
        StateInfo {
            running,
            position_count: self.positions.lock().len(),
            repeat: self.repeat_input.clone(),
            capture_key: self.hotkeys.key_string(HotkeyAction::Capture),
            toggle_key: self.hotkeys.key_string(HotkeyAction::Toggle),
            autoload_path: self.settings.autoload_path.clone(),
            macro_path: self
                .macro_path
                .as_ref()
                .map(|p| p.display().to_string()),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
