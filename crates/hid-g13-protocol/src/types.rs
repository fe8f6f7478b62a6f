//! Joystick axis and zone types.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

/// One of the seven discretised positions of a joystick axis, in ascending
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    Neg3,
    Neg2,
    Neg1,
    Zero,
    Pos1,
    Pos2,
    Pos3,
}

impl Zone {
    pub const ASCENDING: [Zone; 7] = [
        Zone::Neg3,
        Zone::Neg2,
        Zone::Neg1,
        Zone::Zero,
        Zone::Pos1,
        Zone::Pos2,
        Zone::Pos3,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Zone::Neg3 => "NEG_3",
            Zone::Neg2 => "NEG_2",
            Zone::Neg1 => "NEG_1",
            Zone::Zero => "ZERO_0",
            Zone::Pos1 => "POS_1",
            Zone::Pos2 => "POS_2",
            Zone::Pos3 => "POS_3",
        }
    }

    /// Distance from centre, 0..=3.
    pub fn magnitude(self) -> u8 {
        match self {
            Zone::Zero => 0,
            Zone::Neg1 | Zone::Pos1 => 1,
            Zone::Neg2 | Zone::Pos2 => 2,
            Zone::Neg3 | Zone::Pos3 => 3,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Zone::Zero
    }

    /// -1, 0 or +1.
    pub fn direction(self) -> i8 {
        match self {
            Zone::Neg3 | Zone::Neg2 | Zone::Neg1 => -1,
            Zone::Zero => 0,
            Zone::Pos1 | Zone::Pos2 | Zone::Pos3 => 1,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Six ascending thresholds splitting 0..=255 into seven zones.
///
/// A position maps to the zone whose index is the number of thresholds
/// strictly below it. The Y axis uses the reversed zone order because the
/// hardware reports it inverted relative to X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 6]", into = "[u8; 6]")]
pub struct ZoneThresholds([u8; 6]);

impl ZoneThresholds {
    pub const G13: [u8; 6] = [0x25, 0x50, 0x60, 0x80, 0xA0, 0xC0];

    pub fn new(thresholds: [u8; 6]) -> ProtocolResult<Self> {
        if thresholds.windows(2).any(|pair| matches!(pair, [a, b] if a >= b)) {
            return Err(ProtocolError::InvalidThresholds(format!(
                "thresholds must be strictly ascending: {thresholds:02x?}"
            )));
        }
        Ok(Self(thresholds))
    }

    pub fn zone(&self, axis: Axis, position: u8) -> Zone {
        let index = self.0.partition_point(|threshold| *threshold < position);
        let index = match axis {
            Axis::X => index,
            Axis::Y => Zone::ASCENDING.len() - 1 - index,
        };
        Zone::ASCENDING.get(index).copied().unwrap_or(Zone::Zero)
    }

    pub fn as_array(&self) -> [u8; 6] {
        self.0
    }
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self(Self::G13)
    }
}

impl TryFrom<[u8; 6]> for ZoneThresholds {
    type Error = ProtocolError;

    fn try_from(value: [u8; 6]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneThresholds> for [u8; 6] {
    fn from(value: ZoneThresholds) -> Self {
        value.0
    }
}
