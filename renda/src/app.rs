#[cfg(target_os = "macos")]
mod channels;
mod command;
mod dispatch;
mod effects;

pub use dispatch::{dispatch_command, restore_session, Services};

pub struct App {}

#[cfg(not(target_os = "macos"))]
impl App {
    pub fn run() -> anyhow::Result<()> {
        anyhow::bail!("renda start is only supported on macOS")
    }
}

#[cfg(target_os = "macos")]
mod macos_loop {
    use std::cell::RefCell;
    use std::sync::mpsc as std_mpsc;

    use anyhow::{Context, Result};
    use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};
    use objc2_foundation::MainThreadMarker;

    use super::channels::{create_channels, run_async, IpcCommandWithResponse, MainChannels};
    use super::{dispatch_command, restore_session, App, Services};
    use crate::core::{HotkeyAction, Session};
    use crate::macos::{self, HotkeyManager};
    use crate::platform::{
        HotkeyListener, MacOSInputSynthesizer, MacOSNotifier, MacOSPointerSystem,
    };
    use crate::storage::Storage;
    use renda_ipc::{Command, Response};

    type MacOSServices =
        Services<MacOSInputSynthesizer, HotkeyManager, MacOSPointerSystem, MacOSNotifier>;

    struct RunLoopContext {
        ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
        hotkey_rx: std_mpsc::Receiver<HotkeyAction>,
        session: RefCell<Session>,
        services: MacOSServices,
    }

    impl App {
        pub fn run() -> Result<()> {
            if !macos::is_trusted() {
                tracing::warn!("Accessibility permission not granted, requesting...");
                macos::is_trusted_with_prompt();
                anyhow::bail!("Please grant Accessibility permission and restart");
            }

            let storage = Storage::from_env()?;
            tracing::info!("Config directory: {}", storage.dir().display());

            let (tokio_channels, main_channels) = create_channels();

            // Spawn tokio runtime in separate thread
            std::thread::Builder::new()
                .name("renda-ipc".to_string())
                .spawn(move || match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt.block_on(run_async(tokio_channels)),
                    Err(e) => tracing::error!("Failed to start tokio runtime: {}", e),
                })?;

            let app = App {};
            app.run_main_loop(main_channels, storage)
        }

        fn run_main_loop(self, channels: MainChannels, storage: Storage) -> Result<()> {
            tracing::info!("Starting main loop");

            let mtm = MainThreadMarker::new().context("Must be called from main thread")?;

            let MainChannels {
                ipc_cmd_rx,
                hotkey_tx,
                hotkey_rx,
            } = channels;

            let services = Services::new(
                MacOSInputSynthesizer,
                HotkeyManager::new(hotkey_tx),
                MacOSPointerSystem,
                MacOSNotifier::new(mtm),
                storage,
            );
            let session = RefCell::new(Session::new());
            restore_session(&session, &services);

            // Poll commands and hotkey actions from a timer on the main run loop
            let context = Box::into_raw(Box::new(RunLoopContext {
                ipc_cmd_rx,
                hotkey_rx,
                session,
                services,
            }));
            let mut timer_context = core_foundation::runloop::CFRunLoopTimerContext {
                version: 0,
                info: context as *mut _,
                retain: None,
                release: None,
                copyDescription: None,
            };

            extern "C" fn timer_callback(
                _timer: core_foundation::runloop::CFRunLoopTimerRef,
                info: *mut std::ffi::c_void,
            ) {
                let ctx = unsafe { &*(info as *const RunLoopContext) };

                while let Ok((cmd, resp_tx)) = ctx.ipc_cmd_rx.try_recv() {
                    tracing::debug!("Received IPC command: {:?}", cmd);
                    let response = dispatch_command(&cmd, &ctx.session, &ctx.services);
                    let _ = resp_tx.blocking_send(response);

                    // Handle Quit command after sending response
                    if matches!(cmd, Command::Quit) {
                        CFRunLoop::get_current().stop();
                        return;
                    }
                }

                while let Ok(action) = ctx.hotkey_rx.try_recv() {
                    tracing::debug!("Hotkey action: {}", action);
                    let response =
                        dispatch_command(&action.to_command(), &ctx.session, &ctx.services);
                    if let Response::Error { message } = response {
                        tracing::warn!("Hotkey {} failed: {}", action, message);
                    }
                }

                ctx.services.engine.borrow_mut().reap();
            }

            let timer = unsafe {
                core_foundation::runloop::CFRunLoopTimer::new(
                    core_foundation::date::CFAbsoluteTimeGetCurrent(),
                    0.05, // 50ms interval
                    0,
                    0,
                    timer_callback,
                    &mut timer_context,
                )
            };

            let run_loop = CFRunLoop::get_current();
            run_loop.add_timer(&timer, unsafe { kCFRunLoopDefaultMode });

            tracing::info!("Entering CFRunLoop");
            CFRunLoop::run_current();
            tracing::info!("CFRunLoop exited");

            run_loop.remove_timer(&timer, unsafe { kCFRunLoopDefaultMode });

            // The timer no longer fires, so the context can be reclaimed
            let context = unsafe { Box::from_raw(context) };
            context.services.listener.borrow_mut().unregister();
            let mut engine = context.services.engine.borrow_mut();
            engine.stop();
            engine.wait();

            Ok(())
        }
    }
}
