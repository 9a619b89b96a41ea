use std::time::Duration;

use renda_ipc::ClickButton;

use crate::core::{HotkeyRegistry, Point};

/// Trait for querying the pointer from the system.
/// This abstraction allows mocking in tests.
pub trait PointerSystem {
    fn cursor_position(&self) -> Option<Point>;
}

/// Trait for synthesizing pointer input (side effects).
/// Called from the replay worker thread.
pub trait InputSynthesizer: Send + Sync {
    fn move_to(&self, point: Point);
    fn button_down(&self, point: Point, button: ClickButton);
    fn button_up(&self, point: Point, button: ClickButton);

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Trait for the system-wide hotkey hook.
pub trait HotkeyListener {
    /// Installs the bindings of `registry`, replacing whatever was installed.
    fn register(&mut self, registry: &HotkeyRegistry) -> Result<(), String>;
    fn unregister(&mut self);
}

/// Trait for notifications the user has to acknowledge.
pub trait Notifier {
    fn alert(&self, title: &str, message: &str);
}

#[cfg(target_os = "macos")]
pub use macos_impl::*;

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use crate::macos;

    /// macOS implementation of PointerSystem
    #[derive(Default)]
    pub struct MacOSPointerSystem;

    impl PointerSystem for MacOSPointerSystem {
        fn cursor_position(&self) -> Option<Point> {
            macos::cursor_position()
        }
    }

    /// macOS implementation of InputSynthesizer
    #[derive(Default)]
    pub struct MacOSInputSynthesizer;

    impl InputSynthesizer for MacOSInputSynthesizer {
        fn move_to(&self, point: Point) {
            if let Err(e) = macos::post_mouse_move(point) {
                tracing::warn!("Failed to move pointer to ({}): {}", point, e);
            }
        }

        fn button_down(&self, point: Point, button: ClickButton) {
            if let Err(e) = macos::post_mouse_button(point, button, true) {
                tracing::warn!("Failed to press {} at ({}): {}", button, point, e);
            }
        }

        fn button_up(&self, point: Point, button: ClickButton) {
            if let Err(e) = macos::post_mouse_button(point, button, false) {
                tracing::warn!("Failed to release {} at ({}): {}", button, point, e);
            }
        }
    }

    /// macOS implementation of Notifier
    pub struct MacOSNotifier {
        mtm: objc2::MainThreadMarker,
    }

    impl MacOSNotifier {
        pub fn new(mtm: objc2::MainThreadMarker) -> Self {
            Self { mtm }
        }
    }

    impl Notifier for MacOSNotifier {
        fn alert(&self, title: &str, message: &str) {
            macos::show_alert(self.mtm, title, message);
        }
    }
}
