use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton, EventField};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;
use renda_ipc::ClickButton;

use crate::core::Point;

fn event_source() -> Result<CGEventSource, String> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| "Failed to create event source".to_string())
}

fn to_cg_point(point: Point) -> CGPoint {
    CGPoint::new(point.x as f64, point.y as f64)
}

/// Current pointer location in global display coordinates.
pub fn cursor_position() -> Option<Point> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
    let event = CGEvent::new(source).ok()?;
    let location = event.location();
    Some(Point::new(
        location.x.round() as i32,
        location.y.round() as i32,
    ))
}

pub fn post_mouse_move(point: Point) -> Result<(), String> {
    let event = CGEvent::new_mouse_event(
        event_source()?,
        CGEventType::MouseMoved,
        to_cg_point(point),
        CGMouseButton::Left,
    )
    .map_err(|_| "Failed to create mouse move event".to_string())?;
    event.post(CGEventTapLocation::HID);
    Ok(())
}

pub fn post_mouse_button(point: Point, button: ClickButton, down: bool) -> Result<(), String> {
    let (event_type, cg_button) = match (button, down) {
        (ClickButton::Left, true) => (CGEventType::LeftMouseDown, CGMouseButton::Left),
        (ClickButton::Left, false) => (CGEventType::LeftMouseUp, CGMouseButton::Left),
        (ClickButton::Right, true) => (CGEventType::RightMouseDown, CGMouseButton::Right),
        (ClickButton::Right, false) => (CGEventType::RightMouseUp, CGMouseButton::Right),
        (ClickButton::Middle, true) => (CGEventType::OtherMouseDown, CGMouseButton::Center),
        (ClickButton::Middle, false) => (CGEventType::OtherMouseUp, CGMouseButton::Center),
    };

    let event =
        CGEvent::new_mouse_event(event_source()?, event_type, to_cg_point(point), cg_button)
            .map_err(|_| format!("Failed to create {} button event", button))?;
    event.set_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE, 1);
    event.post(CGEventTapLocation::HID);
    Ok(())
}
