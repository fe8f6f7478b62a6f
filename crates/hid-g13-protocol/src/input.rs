//! Input report parsing for the G13

use core::fmt;

use crate::ids::INPUT_REPORT_LEN;
use crate::{ProtocolError, ProtocolResult};

/// Byte index of the joystick X position.
pub const JOYSTICK_X_BYTE: usize = 1;
/// Byte index of the joystick Y position.
pub const JOYSTICK_Y_BYTE: usize = 2;
/// First byte carrying button bitmasks.
pub const FIRST_BUTTON_BYTE: usize = 3;

/// One fixed-length input snapshot polled from the device.
///
/// Byte 0 is reserved, bytes 1 and 2 are the joystick axes, and bytes 3..8
/// are button bitmasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawReport([u8; INPUT_REPORT_LEN]);

impl RawReport {
    pub const fn new(bytes: [u8; INPUT_REPORT_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a report from a raw read.
    ///
    /// Reads shorter than [`INPUT_REPORT_LEN`] are rejected; trailing bytes
    /// beyond the report length are ignored.
    pub fn parse(data: &[u8]) -> ProtocolResult<Self> {
        let head = data
            .get(..INPUT_REPORT_LEN)
            .ok_or(ProtocolError::MalformedReport {
                expected: INPUT_REPORT_LEN,
                actual: data.len(),
            })?;
        let mut bytes = [0u8; INPUT_REPORT_LEN];
        bytes.copy_from_slice(head);
        Ok(Self(bytes))
    }

    pub fn joystick_x(&self) -> u8 {
        self.0[JOYSTICK_X_BYTE]
    }

    pub fn joystick_y(&self) -> u8 {
        self.0[JOYSTICK_Y_BYTE]
    }

    /// Returns whether `bit` of byte `byte` is set. Out-of-range locations
    /// read as unset.
    pub fn bit(&self, byte: u8, bit: u8) -> bool {
        if bit >= 8 {
            return false;
        }
        self.0
            .get(usize::from(byte))
            .is_some_and(|value| value & (1 << bit) != 0)
    }

    pub fn as_bytes(&self) -> &[u8; INPUT_REPORT_LEN] {
        &self.0
    }
}

impl From<[u8; INPUT_REPORT_LEN]> for RawReport {
    fn from(bytes: [u8; INPUT_REPORT_LEN]) -> Self {
        Self(bytes)
    }
}

/// Axis bytes as hex, button bytes as binary.
impl fmt::Display for RawReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (axes, buttons) = self.0.split_at(FIRST_BUTTON_BYTE);
        let mut first = true;
        for byte in axes {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{byte:02x}")?;
        }
        for byte in buttons {
            write!(f, " {byte:08b}")?;
        }
        Ok(())
    }
}
