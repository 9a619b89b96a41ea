use objc2::MainThreadMarker;
use objc2_app_kit::{NSAlert, NSAlertStyle, NSApplication};
use objc2_foundation::NSString;

/// Shows a modal warning and blocks until it is dismissed.
pub fn show_alert(mtm: MainThreadMarker, title: &str, message: &str) {
    let _app = NSApplication::sharedApplication(mtm);

    let alert = NSAlert::new(mtm);
    unsafe {
        alert.setAlertStyle(NSAlertStyle::Warning);
        alert.setMessageText(&NSString::from_str(title));
        alert.setInformativeText(&NSString::from_str(message));
        alert.runModal();
    }
}
