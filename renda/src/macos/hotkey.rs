use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_foundation_sys::mach_port::CFMachPortRef;
use core_graphics::event::{
    CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, CallbackResult, EventField,
};

use crate::core::{format_hotkey, Hotkey, HotkeyAction, HotkeyRegistry, Modifiers};
use crate::platform::HotkeyListener;

extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// Global hotkey hook backed by a CGEventTap on the current run loop.
/// Matched key presses are swallowed and sent as [`HotkeyAction`]s.
pub struct HotkeyManager {
    action_tx: mpsc::Sender<HotkeyAction>,
    tap: Option<HotkeyTap>,
}

impl HotkeyManager {
    pub fn new(action_tx: mpsc::Sender<HotkeyAction>) -> Self {
        Self {
            action_tx,
            tap: None,
        }
    }

    fn create_tap(&self, registry: &HotkeyRegistry) -> Result<HotkeyTap, String> {
        let registry = registry.clone();
        let tx = self.action_tx.clone();

        let mach_port_ptr: Arc<AtomicPtr<c_void>> = Arc::new(AtomicPtr::new(ptr::null_mut()));
        let mach_port_for_callback = Arc::clone(&mach_port_ptr);

        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::Default,
            vec![CGEventType::KeyDown],
            move |_proxy, event_type, event| {
                if matches!(
                    event_type,
                    CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput
                ) {
                    // Happens while a modal alert blocks the run loop.
                    tracing::warn!("Hotkey tap disabled, re-enabling");
                    let ptr = mach_port_for_callback.load(Ordering::Acquire);
                    if !ptr.is_null() {
                        unsafe {
                            CGEventTapEnable(ptr as CFMachPortRef, true);
                        }
                    }
                    return CallbackResult::Keep;
                }

                let key_code =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                let flags = event.get_flags();

                let hotkey = Hotkey {
                    key_code,
                    modifiers: Modifiers {
                        cmd: flags.contains(CGEventFlags::CGEventFlagCommand),
                        alt: flags.contains(CGEventFlags::CGEventFlagAlternate),
                        ctrl: flags.contains(CGEventFlags::CGEventFlagControl),
                        shift: flags.contains(CGEventFlags::CGEventFlagShift),
                    },
                };

                let Some(action) = registry.action_for(&hotkey) else {
                    return CallbackResult::Keep;
                };

                let autorepeat =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
                if !autorepeat {
                    tracing::debug!("Hotkey matched: {} -> {}", format_hotkey(&hotkey), action);
                    if tx.send(action).is_err() {
                        tracing::error!("Failed to send hotkey action");
                    }
                }
                CallbackResult::Drop
            },
        )
        .map_err(|_| {
            "Failed to create event tap. Make sure Accessibility permission is granted."
        })?;

        mach_port_ptr.store(
            tap.mach_port().as_concrete_TypeRef() as *mut c_void,
            Ordering::Release,
        );

        tap.enable();

        let source = tap
            .mach_port()
            .create_runloop_source(0)
            .map_err(|_| "Failed to create run loop source")?;

        CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopCommonModes });

        Ok(HotkeyTap { _tap: tap, source })
    }
}

impl HotkeyListener for HotkeyManager {
    fn register(&mut self, registry: &HotkeyRegistry) -> Result<(), String> {
        // Drop the old tap first so both never see the same key.
        self.unregister();
        self.tap = Some(self.create_tap(registry)?);
        tracing::info!(
            "Hotkey tap registered (capture={}, toggle={})",
            registry.key_string(HotkeyAction::Capture),
            registry.key_string(HotkeyAction::Toggle)
        );
        Ok(())
    }

    fn unregister(&mut self) {
        if self.tap.take().is_some() {
            tracing::info!("Hotkey tap unregistered");
        }
    }
}

struct HotkeyTap {
    _tap: CGEventTap<'static>,
    source: CFRunLoopSource,
}

impl Drop for HotkeyTap {
    fn drop(&mut self) {
        CFRunLoop::get_current().remove_source(&self.source, unsafe { kCFRunLoopCommonModes });
    }
}
