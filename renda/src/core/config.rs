use super::{HotkeyRegistry, PositionList};

/// A saved macro: the positions, both hotkeys and the repeat count.
/// A repeat count of `0` means repeat until cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroConfig {
    pub positions: PositionList,
    pub hotkeys: HotkeyRegistry,
    pub repeat_count: u32,
}

/// Daemon settings, stored apart from any macro.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub autoload_path: Option<String>,
}
