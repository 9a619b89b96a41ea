use crate::core::{Delay, HotkeyAction, Point, Session};
use crate::effect::{CommandResult, Effect};
use renda_ipc::{Command, Response};

pub const REPEAT_ERROR_TITLE: &str = "Invalid repeat count";

/// Pure function: processes a command and returns a response with effects.
/// This function does not perform any side effects - it only mutates state and computes effects.
pub fn process_command(session: &mut Session, running: bool, cmd: &Command) -> CommandResult {
    match cmd {
        // Position list
        Command::AddPosition => {
            let index = session.positions.lock().add();
            tracing::debug!("Added position {}", index + 1);
            CommandResult::ok()
        }
        Command::RemovePosition { index } => {
            if session.positions.lock().remove_at(*index).is_some() {
                tracing::debug!("Removed position {}", index + 1);
            }
            CommandResult::ok()
        }
        Command::ClearPositions => {
            session.positions.lock().clear();
            tracing::debug!("Cleared positions");
            CommandResult::ok()
        }
        Command::SetDelay { index, delay } => {
            let mut positions = session.positions.lock();
            if positions.set_delay(*index, Delay::parse(delay)) {
                CommandResult::ok()
            } else {
                CommandResult::error(out_of_range(*index, positions.len()))
            }
        }
        Command::SetButton { index, button } => {
            let mut positions = session.positions.lock();
            if positions.set_button(*index, *button) {
                CommandResult::ok()
            } else {
                CommandResult::error(out_of_range(*index, positions.len()))
            }
        }

        // Replay
        Command::SetRepeat { count } => {
            session.repeat_input = count.clone();
            CommandResult::ok()
        }
        Command::ToggleReplay => {
            // A run that ends before the effect executes must not restart
            if running {
                return CommandResult::with_effects(
                    Response::Replay { running: false },
                    vec![Effect::StopReplay],
                );
            }
            match session.repeat_limit() {
                Ok(limit) => {
                    tracing::debug!("Starting replay ({:?})", limit);
                    session.last_error = None;
                    CommandResult::with_effects(
                        Response::Replay { running: true },
                        vec![Effect::ToggleReplay],
                    )
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::error!("{}", message);
                    session.last_error = Some(message.clone());
                    CommandResult::with_effects(
                        Response::error(message.clone()),
                        vec![Effect::Alert {
                            title: REPEAT_ERROR_TITLE.to_string(),
                            message,
                        }],
                    )
                }
            }
        }
        Command::StopReplay => CommandResult::ok_with_effects(vec![Effect::StopReplay]),

        // Hotkeys
        Command::BindCapture { key } => bind(session, HotkeyAction::Capture, key),
        Command::BindToggle { key } => bind(session, HotkeyAction::Toggle, key),

        // Persistence
        Command::Save { path } => match session.to_config() {
            Ok(config) => CommandResult::ok_with_effects(vec![Effect::SaveMacro {
                path: path.clone(),
                config,
            }]),
            Err(e) => {
                tracing::warn!("Not saving {}: {}", path, e);
                CommandResult::error(e.to_string())
            }
        },
        Command::Load { path } => {
            CommandResult::ok_with_effects(vec![Effect::LoadMacro { path: path.clone() }])
        }
        Command::SetAutoload { path } => {
            CommandResult::ok_with_effects(vec![Effect::SetAutoload { path: path.clone() }])
        }
        Command::ClearAutoload => CommandResult::ok_with_effects(vec![Effect::ClearAutoload]),

        // Need the pointer or the config directory; intercepted in dispatch_command
        Command::CapturePosition | Command::ListConfigs => {
            CommandResult::error("Command requires system access")
        }

        // Queries
        Command::ListPositions => CommandResult::with_response(Response::Positions {
            positions: session.positions.lock().to_info(),
        }),
        Command::GetState => CommandResult::with_response(Response::State {
            state: session.state_info(running),
        }),

        // Control
        Command::Quit => {
            tracing::info!("Quit command received");
            CommandResult::ok_with_effects(vec![Effect::StopReplay])
        }
    }
}

/// Writes the pointer location into the first unset slot, or appends one.
pub fn capture_position(session: &mut Session, point: Option<Point>) -> CommandResult {
    let Some(point) = point else {
        return CommandResult::error("Failed to read pointer position");
    };
    let index = session.positions.lock().capture_into(point);
    tracing::info!("Captured position {} at ({})", index + 1, point);
    CommandResult::with_response(Response::Captured {
        index,
        x: point.x,
        y: point.y,
    })
}

fn bind(session: &mut Session, action: HotkeyAction, key: &str) -> CommandResult {
    match session.hotkeys.bind(action, key) {
        Ok(()) => CommandResult::ok_with_effects(vec![Effect::RegisterHotkeys]),
        Err(e) => CommandResult::error(e.to_string()),
    }
}

fn out_of_range(index: usize, len: usize) -> String {
    format!("No position {} (list has {})", index + 1, len)
}
