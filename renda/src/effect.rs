use crate::core::MacroConfig;

use renda_ipc::Response;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ToggleReplay,
    StopReplay,
    RegisterHotkeys,
    SaveMacro { path: String, config: MacroConfig },
    LoadMacro { path: String },
    SetAutoload { path: String },
    ClearAutoload,
    Alert { title: String, message: String },
}

pub struct CommandResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            response: Response::Ok,
            effects: vec![],
        }
    }

    pub fn ok_with_effects(effects: Vec<Effect>) -> Self {
        Self {
            response: Response::Ok,
            effects,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: Response::error(message),
            effects: vec![],
        }
    }

    pub fn with_response(response: Response) -> Self {
        Self {
            response,
            effects: vec![],
        }
    }

    pub fn with_effects(response: Response, effects: Vec<Effect>) -> Self {
        Self { response, effects }
    }
}
