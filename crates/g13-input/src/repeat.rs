//! Repeat clock for an off-centre joystick.

use hid_g13_protocol::{Axis, Zone};
use serde::{Deserialize, Serialize};

use crate::events::{EventSink, InputEvent};
use crate::{InputError, InputResult};

/// Repeat timing, in repeat-clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatPolicy {
    /// Ticks an axis must stay off centre before the first repeat
    pub initial_delay_ticks: u32,
    /// Fire every Nth tick, indexed by zone magnitude 1..=3
    pub cadence: [u32; 3],
}

impl RepeatPolicy {
    pub fn validate(&self) -> InputResult<()> {
        if self.cadence.contains(&0) {
            return Err(InputError::InvalidCadence(
                "cadence entries must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Tick modulus for a zone, `None` for the centre.
    pub fn modulus(&self, zone: Zone) -> Option<u32> {
        match zone.magnitude() {
            0 => None,
            m => self.cadence.get(usize::from(m) - 1).copied(),
        }
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ticks: 4,
            cadence: [4, 2, 1],
        }
    }
}

/// Per-axis repeat counters driven by a periodic tick.
#[derive(Debug, Clone)]
pub struct RepeatClock {
    policy: RepeatPolicy,
    held_ticks: [u32; 2],
}

impl RepeatClock {
    pub fn new(policy: RepeatPolicy) -> InputResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            held_ticks: [0; 2],
        })
    }

    /// Advance one tick given the current zone of each axis.
    ///
    /// An axis back at centre resets its counter immediately.
    pub fn tick(&mut self, zones: [(Axis, Zone); 2], sink: &mut impl EventSink) {
        for (counter, (axis, zone)) in self.held_ticks.iter_mut().zip(zones) {
            let Some(modulus) = self.policy.modulus(zone) else {
                *counter = 0;
                continue;
            };
            *counter = counter.saturating_add(1);
            let Some(elapsed) = counter.checked_sub(self.policy.initial_delay_ticks) else {
                continue;
            };
            if elapsed > 0 && elapsed % modulus == 0 {
                sink.emit(InputEvent::Repeat { axis, zone });
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.held_ticks.iter().all(|ticks| *ticks == 0)
    }

    pub fn policy(&self) -> &RepeatPolicy {
        &self.policy
    }
}
