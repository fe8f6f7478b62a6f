//! Turns raw G13 reports into logical input events.
//!
//! The decoder is the single consumer of inbound reports. It keeps the set
//! of held keys and the zone of each joystick axis, and emits only changes:
//!
//! - `<KEY>_PRESSED` / `<KEY>_RELEASED` from a set difference of held keys
//! - `JOY_<AXIS>_<ZONE>` when an axis changes zone, with a single event on
//!   the return to centre
//! - repeat events on a separate clock while an axis is off centre
//!
//! Key events can then be resolved through a [`MappingTable`] into chords
//! or named behaviours.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod buttons;
pub mod decoder;
pub mod events;
pub mod joystick;
pub mod mapping;
pub mod repeat;

pub use buttons::ButtonDecoder;
pub use decoder::{InputDecoder, InputSettings};
pub use events::{EventSink, InputEvent};
pub use joystick::JoystickTracker;
pub use mapping::{BehaviorId, BehaviorRegistry, Dispatch, KeyAction, KeyMapper, MappingTable};
pub use repeat::{RepeatClock, RepeatPolicy};

use hid_g13_protocol::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid repeat cadence: {0}")]
    InvalidCadence(String),

    #[error("Mapping for {key} refers to unknown behavior {behavior}")]
    UnknownBehavior { key: String, behavior: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type InputResult<T> = Result<T, InputError>;
