//! Raw report builders.
//!
//! Reports default to a centred joystick (`0x80`, `0x80`) so a fixture only
//! asserts the controls a test names.

use hid_g13_protocol::{KeycodeTable, RawReport};

/// Joystick byte value for a centred stick.
pub const CENTER: u8 = 0x80;

/// A report with a centred stick and no keys held.
pub fn idle_report() -> RawReport {
    RawReport::new([0, CENTER, CENTER, 0, 0, 0, 0, 0])
}

/// A report with the stick at (`x`, `y`) and no keys held.
pub fn joystick_report(x: u8, y: u8) -> RawReport {
    RawReport::new([0, x, y, 0, 0, 0, 0, 0])
}

/// A report with the named keys held on the stock G13 layout.
///
/// # Panics
///
/// Panics if a name is not on the stock layout.
#[track_caller]
pub fn report_with_keys(keys: &[&str]) -> RawReport {
    report_with_keys_at(keys, CENTER, CENTER)
}

/// A report with the named keys held and the stick at (`x`, `y`).
///
/// # Panics
///
/// Panics if a name is not on the stock layout.
#[track_caller]
pub fn report_with_keys_at(keys: &[&str], x: u8, y: u8) -> RawReport {
    let table = KeycodeTable::g13();
    let mut bytes = [0, x, y, 0, 0, 0, 0, 0];
    for key in keys {
        let Some(location) = table.location(key) else {
            panic!("report_with_keys: unknown key {key:?}");
        };
        let Some(byte) = bytes.get_mut(usize::from(location.byte)) else {
            panic!("report_with_keys: byte {} out of range", location.byte);
        };
        *byte |= 1 << location.bit;
    }
    RawReport::new(bytes)
}
