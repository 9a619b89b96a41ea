use std::cell::RefCell;
use std::path::Path;

use crate::core::Session;
use crate::effect::Effect;
use crate::platform::{HotkeyListener, InputSynthesizer, Notifier, PointerSystem};

use super::dispatch::Services;

/// Execute side effects.
pub fn execute_effects<S, L, P, N>(
    effects: Vec<Effect>,
    session: &RefCell<Session>,
    services: &Services<S, L, P, N>,
) -> Result<(), String>
where
    S: InputSynthesizer + 'static,
    L: HotkeyListener,
    P: PointerSystem,
    N: Notifier,
{
    for effect in effects {
        match effect {
            Effect::ToggleReplay => {
                let result = {
                    let session = session.borrow();
                    services
                        .engine
                        .borrow_mut()
                        .toggle(&session.positions, &session.repeat_input)
                };
                if let Err(e) = result {
                    let message = e.to_string();
                    tracing::error!("{}", message);
                    session.borrow_mut().last_error = Some(message.clone());
                    return Err(message);
                }
            }
            Effect::StopReplay => {
                services.engine.borrow_mut().stop();
            }
            Effect::RegisterHotkeys => {
                let hotkeys = session.borrow().hotkeys.clone();
                services
                    .listener
                    .borrow_mut()
                    .register(&hotkeys)
                    .map_err(|e| format!("Failed to register hotkeys: {}", e))?;
            }
            Effect::SaveMacro { path, config } => {
                let path = services.storage.resolve(&path);
                services
                    .storage
                    .save_macro(&path, &config)
                    .map_err(|e| format!("{:#}", e))?;
                session.borrow_mut().macro_path = Some(path);
            }
            Effect::LoadMacro { path } => {
                let path = services.storage.resolve(&path);
                let current = session.borrow().hotkeys.clone();
                let config = match services.storage.load_macro(&path, &current) {
                    Ok(Some(config)) => config,
                    Ok(None) => return Err(format!("File not found: {}", path.display())),
                    Err(e) => {
                        tracing::warn!("{:#}", e);
                        return Err(format!("{:#}", e));
                    }
                };
                let hotkeys_changed = config.hotkeys != current;
                session.borrow_mut().apply_config(config, Some(path));
                if hotkeys_changed {
                    let hotkeys = session.borrow().hotkeys.clone();
                    services
                        .listener
                        .borrow_mut()
                        .register(&hotkeys)
                        .map_err(|e| format!("Failed to register hotkeys: {}", e))?;
                }
            }
            Effect::SetAutoload { path } => {
                let path = services.storage.resolve(&path);
                if !path.is_file() {
                    return Err(format!("File not found: {}", path.display()));
                }
                set_autoload(session, services, Some(&path))?;
            }
            Effect::ClearAutoload => {
                set_autoload(session, services, None)?;
            }
            Effect::Alert { title, message } => {
                services.notifier.alert(&title, &message);
            }
        }
    }
    Ok(())
}

fn set_autoload<S, L, P, N>(
    session: &RefCell<Session>,
    services: &Services<S, L, P, N>,
    path: Option<&Path>,
) -> Result<(), String>
where
    S: InputSynthesizer + 'static,
{
    let mut settings = session.borrow().settings.clone();
    settings.autoload_path = path.map(|p| p.display().to_string());
    services
        .storage
        .save_settings(&settings)
        .map_err(|e| format!("{:#}", e))?;

    match &settings.autoload_path {
        Some(p) => tracing::info!("Autoload set to {}", p),
        None => tracing::info!("Autoload cleared"),
    }
    session.borrow_mut().settings = settings;
    Ok(())
}
