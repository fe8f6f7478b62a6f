//! Joystick zone tracking with return-to-centre hysteresis.

use hid_g13_protocol::{Axis, RawReport, Zone, ZoneThresholds};

use crate::events::{EventSink, InputEvent};

/// Per-axis zone state.
///
/// An axis emits when it moves into a different zone. Sitting in the same
/// zone emits nothing, so the centre zone is reported exactly once per
/// return and a stick resting on a threshold does not flood consumers.
#[derive(Debug, Clone)]
pub struct JoystickTracker {
    thresholds: ZoneThresholds,
    x: Zone,
    y: Zone,
}

impl JoystickTracker {
    pub fn new(thresholds: ZoneThresholds) -> Self {
        Self {
            thresholds,
            x: Zone::Zero,
            y: Zone::Zero,
        }
    }

    pub fn decode(&mut self, report: &RawReport, sink: &mut impl EventSink) {
        let x = self.thresholds.zone(Axis::X, report.joystick_x());
        let y = self.thresholds.zone(Axis::Y, report.joystick_y());
        Self::transition(&mut self.x, Axis::X, x, sink);
        Self::transition(&mut self.y, Axis::Y, y, sink);
    }

    fn transition(current: &mut Zone, axis: Axis, next: Zone, sink: &mut impl EventSink) {
        if *current == next {
            return;
        }
        *current = next;
        sink.emit(InputEvent::Joystick { axis, zone: next });
    }

    pub fn zone(&self, axis: Axis) -> Zone {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn is_centred(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    pub fn thresholds(&self) -> &ZoneThresholds {
        &self.thresholds
    }
}
