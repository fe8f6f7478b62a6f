//! Logical input events and where they go.

use core::fmt;

use hid_g13_protocol::{Axis, Zone};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputEvent {
    KeyPressed(String),
    KeyReleased(String),
    /// An axis changed zone
    Joystick { axis: Axis, zone: Zone },
    /// Repeat clock fired for an off-centre axis
    Repeat { axis: Axis, zone: Zone },
}

impl InputEvent {
    /// The key name for press/release events.
    pub fn key(&self) -> Option<&str> {
        match self {
            InputEvent::KeyPressed(key) | InputEvent::KeyReleased(key) => Some(key),
            InputEvent::Joystick { .. } | InputEvent::Repeat { .. } => None,
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self, InputEvent::KeyPressed(_))
    }

    /// Wire-style event code, e.g. `G11_PRESSED` or `JOY_X_POS_2`.
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::KeyPressed(key) => write!(f, "{key}_PRESSED"),
            InputEvent::KeyReleased(key) => write!(f, "{key}_RELEASED"),
            InputEvent::Joystick { axis, zone } => write!(f, "JOY_{}_{}", axis.label(), zone.label()),
            InputEvent::Repeat { axis, zone } => {
                write!(f, "JOY_{}_{}_REPEAT", axis.label(), zone.label())
            }
        }
    }
}

/// Receiver of decoded events.
pub trait EventSink {
    fn emit(&mut self, event: InputEvent);
}

impl EventSink for Vec<InputEvent> {
    fn emit(&mut self, event: InputEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: InputEvent) {
        (**self).emit(event);
    }
}
