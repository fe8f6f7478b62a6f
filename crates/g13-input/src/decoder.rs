//! The complete report decoder.

use std::collections::BTreeSet;

use hid_g13_protocol::{Axis, KeycodeTable, RawReport, Zone, ZoneThresholds};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buttons::ButtonDecoder;
use crate::events::EventSink;
use crate::joystick::JoystickTracker;
use crate::repeat::{RepeatClock, RepeatPolicy};
use crate::InputResult;

/// Decoder policy: keycode layout, zone thresholds, and repeat timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub keycodes: KeycodeTable,
    pub thresholds: ZoneThresholds,
    pub repeat: RepeatPolicy,
}

impl InputSettings {
    pub fn validate(&self) -> InputResult<()> {
        self.keycodes.validate()?;
        self.repeat.validate()?;
        Ok(())
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            keycodes: KeycodeTable::g13(),
            thresholds: ZoneThresholds::default(),
            repeat: RepeatPolicy::default(),
        }
    }
}

/// Stateful translator from reports to events.
///
/// Must have exactly one owner: the consumer of the transport's inbound
/// queue.
#[derive(Debug, Clone)]
pub struct InputDecoder {
    buttons: ButtonDecoder,
    joystick: JoystickTracker,
    repeat: RepeatClock,
}

impl InputDecoder {
    pub fn new(settings: InputSettings) -> InputResult<Self> {
        settings.validate()?;
        Ok(Self {
            buttons: ButtonDecoder::new(settings.keycodes),
            joystick: JoystickTracker::new(settings.thresholds),
            repeat: RepeatClock::new(settings.repeat)?,
        })
    }

    /// Decode one report: key edges first, then joystick transitions.
    pub fn decode(&mut self, report: &RawReport, sink: &mut impl EventSink) {
        trace!(%report, "Decoding report");
        self.buttons.decode(report, sink);
        self.joystick.decode(report, sink);
    }

    /// Advance the repeat clock by one tick.
    pub fn repeat_tick(&mut self, sink: &mut impl EventSink) {
        let zones = [
            (Axis::X, self.joystick.zone(Axis::X)),
            (Axis::Y, self.joystick.zone(Axis::Y)),
        ];
        self.repeat.tick(zones, sink);
    }

    pub fn held(&self) -> &BTreeSet<String> {
        self.buttons.held()
    }

    pub fn zone(&self, axis: Axis) -> Zone {
        self.joystick.zone(axis)
    }
}
