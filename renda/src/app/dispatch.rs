use std::cell::RefCell;

use crate::core::Session;
use crate::platform::{HotkeyListener, InputSynthesizer, Notifier, PointerSystem};
use crate::replay::ReplayEngine;
use crate::storage::Storage;
use renda_ipc::{Command, Response};

use super::command::{capture_position, process_command};
use super::effects::execute_effects;

/// Everything outside the session that commands reach into.
pub struct Services<S: InputSynthesizer + 'static, L, P, N> {
    pub engine: RefCell<ReplayEngine<S>>,
    pub listener: RefCell<L>,
    pub pointer: P,
    pub notifier: N,
    pub storage: Storage,
}

impl<S, L, P, N> Services<S, L, P, N>
where
    S: InputSynthesizer + 'static,
    L: HotkeyListener,
    P: PointerSystem,
    N: Notifier,
{
    pub fn new(synth: S, listener: L, pointer: P, notifier: N, storage: Storage) -> Self {
        Self {
            engine: RefCell::new(ReplayEngine::new(synth)),
            listener: RefCell::new(listener),
            pointer,
            notifier,
            storage,
        }
    }
}

/// Unified command dispatcher for IPC and hotkey commands.
pub fn dispatch_command<S, L, P, N>(
    cmd: &Command,
    session: &RefCell<Session>,
    services: &Services<S, L, P, N>,
) -> Response
where
    S: InputSynthesizer + 'static,
    L: HotkeyListener,
    P: PointerSystem,
    N: Notifier,
{
    services.engine.borrow_mut().reap();

    // These need system access and never produce effects
    match cmd {
        Command::CapturePosition => {
            let point = services.pointer.cursor_position();
            return capture_position(&mut session.borrow_mut(), point).response;
        }
        Command::ListConfigs => {
            return match services.storage.list_configs() {
                Ok(configs) => Response::Configs { configs },
                Err(e) => Response::error(format!("{:#}", e)),
            };
        }
        _ => {}
    }

    let running = services.engine.borrow().is_running();
    let result = process_command(&mut session.borrow_mut(), running, cmd);

    if let Err(e) = execute_effects(result.effects, session, services) {
        return Response::Error { message: e };
    }

    result.response
}

/// Installs the hotkeys, then loads settings and the autoload macro if one
/// is configured. Failures are logged and leave the empty session.
pub fn restore_session<S, L, P, N>(session: &RefCell<Session>, services: &Services<S, L, P, N>)
where
    S: InputSynthesizer + 'static,
    L: HotkeyListener,
    P: PointerSystem,
    N: Notifier,
{
    let hotkeys = session.borrow().hotkeys.clone();
    if let Err(e) = services.listener.borrow_mut().register(&hotkeys) {
        tracing::error!("Failed to register hotkeys: {}", e);
    }

    match services.storage.load_settings() {
        Ok(settings) => session.borrow_mut().settings = settings,
        Err(e) => {
            tracing::warn!("Failed to load settings: {:#}", e);
            return;
        }
    }

    let Some(path) = session.borrow().settings.autoload_path.clone() else {
        return;
    };
    tracing::info!("Autoloading {}", path);
    if let Response::Error { message } =
        dispatch_command(&Command::Load { path }, session, services)
    {
        tracing::warn!("Autoload failed: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HotkeyAction, Settings};
    use crate::platform::mock::{
        InputEvent, MockHotkeyListener, MockInputSynthesizer, MockNotifier, MockPointerSystem,
    };
    use tempfile::TempDir;

    type TestServices =
        Services<MockInputSynthesizer, MockHotkeyListener, MockPointerSystem, MockNotifier>;

    fn setup_test_context() -> (TempDir, RefCell<Session>, TestServices) {
        let tmp = TempDir::new().unwrap();
        let services = Services::new(
            MockInputSynthesizer::new(),
            MockHotkeyListener::default(),
            MockPointerSystem::at(120, 340),
            MockNotifier::default(),
            Storage::new(tmp.path()),
        );
        (tmp, RefCell::new(Session::new()), services)
    }

    fn dispatch(cmd: Command, session: &RefCell<Session>, services: &TestServices) -> Response {
        dispatch_command(&cmd, session, services)
    }

    #[test]
    fn test_dispatch_capture_uses_pointer() {
        let (_tmp, session, services) = setup_test_context();

        let response = dispatch(Command::CapturePosition, &session, &services);

        assert_eq!(
            response,
            Response::Captured {
                index: 0,
                x: 120,
                y: 340
            }
        );
        assert_eq!(session.borrow().positions.lock().len(), 1);
    }

    #[test]
    fn test_dispatch_toggle_runs_replay() {
        let (_tmp, session, services) = setup_test_context();
        dispatch(Command::CapturePosition, &session, &services);
        dispatch(
            Command::SetRepeat {
                count: "2".to_string(),
            },
            &session,
            &services,
        );

        let response = dispatch(Command::ToggleReplay, &session, &services);
        assert_eq!(response, Response::Replay { running: true });

        let summary = services.engine.borrow_mut().wait().unwrap();
        assert_eq!(summary.passes, 2);
        let moves = services
            .engine
            .borrow()
            .synth()
            .events()
            .into_iter()
            .filter(|e| matches!(e, InputEvent::Move(_)))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn test_stop_toggle_after_run_ended_does_not_restart() {
        let (_tmp, session, services) = setup_test_context();
        dispatch(Command::CapturePosition, &session, &services);
        dispatch(
            Command::SetRepeat {
                count: "1".to_string(),
            },
            &session,
            &services,
        );
        dispatch(Command::ToggleReplay, &session, &services);
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while services.engine.borrow().is_running() {
            assert!(std::time::Instant::now() < deadline, "timed out");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        // Toggle decided while the run still looked live
        let result = process_command(&mut session.borrow_mut(), true, &Command::ToggleReplay);
        assert_eq!(result.response, Response::Replay { running: false });
        execute_effects(result.effects, &session, &services).unwrap();

        assert!(!services.engine.borrow().is_running());
        let summary = services.engine.borrow_mut().wait().unwrap();
        assert_eq!(summary.passes, 1);
        assert!(services.engine.borrow_mut().wait().is_none());
    }

    #[test]
    fn test_dispatch_toggle_invalid_repeat_alerts() {
        let (_tmp, session, services) = setup_test_context();
        dispatch(
            Command::SetRepeat {
                count: "abc".to_string(),
            },
            &session,
            &services,
        );

        let response = dispatch(Command::ToggleReplay, &session, &services);

        assert!(matches!(response, Response::Error { .. }));
        assert!(!services.engine.borrow().is_running());
        assert_eq!(services.notifier.alerts.borrow().len(), 1);
        assert!(session.borrow().last_error.is_some());

        match dispatch(Command::GetState, &session, &services) {
            Response::State { state } => assert!(state.last_error.is_some()),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_bind_reregisters() {
        let (_tmp, session, services) = setup_test_context();

        let response = dispatch(
            Command::BindCapture {
                key: "ctrl-c".to_string(),
            },
            &session,
            &services,
        );

        assert_eq!(response, Response::Ok);
        let listener = services.listener.borrow();
        let registered = listener.registered.as_ref().unwrap();
        assert_eq!(registered.key_string(HotkeyAction::Capture), "ctrl-c");
    }

    #[test]
    fn test_dispatch_bind_listener_failure() {
        let (_tmp, session, services) = setup_test_context();
        services.listener.borrow_mut().fail = true;

        let response = dispatch(
            Command::BindToggle {
                key: "f9".to_string(),
            },
            &session,
            &services,
        );

        assert!(matches!(response, Response::Error { .. }));
    }

    #[test]
    fn test_dispatch_save_and_load() {
        let (tmp, session, services) = setup_test_context();
        dispatch(Command::CapturePosition, &session, &services);
        dispatch(
            Command::BindToggle {
                key: "f9".to_string(),
            },
            &session,
            &services,
        );
        dispatch(
            Command::SetRepeat {
                count: "4".to_string(),
            },
            &session,
            &services,
        );

        let response = dispatch(
            Command::Save {
                path: "work".to_string(),
            },
            &session,
            &services,
        );
        assert_eq!(response, Response::Ok);
        let saved = tmp.path().join("work.json");
        assert!(saved.is_file());
        assert_eq!(session.borrow().macro_path.as_deref(), Some(saved.as_path()));

        let fresh = RefCell::new(Session::new());
        let response = dispatch(
            Command::Load {
                path: "work".to_string(),
            },
            &fresh,
            &services,
        );
        assert_eq!(response, Response::Ok);

        let fresh = fresh.borrow();
        assert_eq!(fresh.positions.lock().len(), 1);
        assert_eq!(fresh.repeat_input, "4");
        assert_eq!(fresh.hotkeys.key_string(HotkeyAction::Toggle), "f9");
    }

    #[test]
    fn test_dispatch_load_missing_keeps_state() {
        let (_tmp, session, services) = setup_test_context();
        dispatch(Command::CapturePosition, &session, &services);

        let response = dispatch(
            Command::Load {
                path: "missing".to_string(),
            },
            &session,
            &services,
        );

        match response {
            Response::Error { message } => assert!(message.contains("missing.json")),
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(session.borrow().positions.lock().len(), 1);
    }

    #[test]
    fn test_dispatch_autoload_settings() {
        let (tmp, session, services) = setup_test_context();

        let response = dispatch(
            Command::SetAutoload {
                path: "nothing".to_string(),
            },
            &session,
            &services,
        );
        assert!(matches!(response, Response::Error { .. }));

        dispatch(
            Command::Save {
                path: "daily".to_string(),
            },
            &session,
            &services,
        );
        let response = dispatch(
            Command::SetAutoload {
                path: "daily".to_string(),
            },
            &session,
            &services,
        );
        assert_eq!(response, Response::Ok);

        let expected = tmp.path().join("daily.json").display().to_string();
        assert_eq!(
            services.storage.load_settings().unwrap().autoload_path,
            Some(expected)
        );

        dispatch(Command::ClearAutoload, &session, &services);
        assert_eq!(services.storage.load_settings().unwrap(), Settings::default());
        assert!(session.borrow().settings.autoload_path.is_none());
    }

    #[test]
    fn test_dispatch_list_configs() {
        let (_tmp, session, services) = setup_test_context();
        for name in ["b", "a"] {
            dispatch(
                Command::Save {
                    path: name.to_string(),
                },
                &session,
                &services,
            );
        }

        let response = dispatch(Command::ListConfigs, &session, &services);

        assert_eq!(
            response,
            Response::Configs {
                configs: vec!["a.json".to_string(), "b.json".to_string()]
            }
        );
    }

    #[test]
    fn test_restore_session_autoloads() {
        let (_tmp, session, services) = setup_test_context();
        dispatch(Command::CapturePosition, &session, &services);
        dispatch(Command::CapturePosition, &session, &services);
        dispatch(
            Command::Save {
                path: "boot".to_string(),
            },
            &session,
            &services,
        );
        dispatch(
            Command::SetAutoload {
                path: "boot".to_string(),
            },
            &session,
            &services,
        );

        let restored = RefCell::new(Session::new());
        restore_session(&restored, &services);

        assert_eq!(restored.borrow().positions.lock().len(), 2);
        assert!(restored.borrow().settings.autoload_path.is_some());
        assert!(services.listener.borrow().registered.is_some());
    }

    #[test]
    fn test_restore_session_missing_autoload_target() {
        let (tmp, session, services) = setup_test_context();
        services
            .storage
            .save_settings(&Settings {
                autoload_path: Some(tmp.path().join("gone.json").display().to_string()),
            })
            .unwrap();

        restore_session(&session, &services);

        assert!(session.borrow().positions.lock().is_empty());
        assert_eq!(services.listener.borrow().register_count, 1);
    }

    #[test]
    fn test_dispatch_quit_stops_replay() {
        let tmp = TempDir::new().unwrap();
        let services = Services::new(
            MockInputSynthesizer::new().with_real_sleep(),
            MockHotkeyListener::default(),
            MockPointerSystem::at(1, 1),
            MockNotifier::default(),
            Storage::new(tmp.path()),
        );
        let session = RefCell::new(Session::new());
        dispatch_command(&Command::CapturePosition, &session, &services);
        dispatch_command(&Command::ToggleReplay, &session, &services);
        assert!(services.engine.borrow().is_running());

        let response = dispatch_command(&Command::Quit, &session, &services);

        assert_eq!(response, Response::Ok);
        assert!(!services.engine.borrow().is_running());
        assert!(services.engine.borrow_mut().wait().unwrap().cancelled);
    }
}
