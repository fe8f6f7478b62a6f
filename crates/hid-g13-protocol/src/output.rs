//! G13 output report encoding.
//!
//! LED and backlight updates travel as 5-byte `SET_REPORT` control
//! transfers; LCD frames are a 32-byte header followed by the packed
//! bitmap, written to the LCD interrupt endpoint.
//!
//! ```text
//! LEDs:      [0x05, mask, 0, 0, 0]      mask bit i = LED i (M1, M2, M3, MR)
//! Backlight: [0x07, r, g, b, 0]
//! LCD:       [0x03, 0 x 31] ++ packed bitmap (960 bytes)
//! ```

use crate::ids::{LED_COUNT, lcd, report_ids};
use crate::{ProtocolError, ProtocolResult};

/// Wire size of the LED report.
pub const LED_REPORT_LEN: usize = 5;

/// Wire size of the backlight report.
pub const BACKLIGHT_REPORT_LEN: usize = 5;

/// Fold per-LED states into the report mask. States beyond [`LED_COUNT`]
/// are ignored.
pub fn led_mask(states: &[bool]) -> u8 {
    states
        .iter()
        .take(LED_COUNT)
        .enumerate()
        .filter(|(_, on)| **on)
        .fold(0u8, |mask, (index, _)| mask | (1 << index))
}

pub fn build_led_report(mask: u8) -> [u8; LED_REPORT_LEN] {
    [report_ids::LEDS, mask, 0x00, 0x00, 0x00]
}

pub fn build_backlight_report(r: u8, g: u8, b: u8) -> [u8; BACKLIGHT_REPORT_LEN] {
    [report_ids::BACKLIGHT, r, g, b, 0x00]
}

pub fn lcd_header() -> [u8; lcd::HEADER_LEN] {
    let mut header = [0u8; lcd::HEADER_LEN];
    header[0] = report_ids::LCD;
    header
}

/// Prefix a packed LCD payload with the frame header.
pub fn build_lcd_frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    if payload.len() != lcd::PAYLOAD_LEN {
        return Err(ProtocolError::InvalidPayload {
            expected: lcd::PAYLOAD_LEN,
            actual: payload.len(),
        });
    }
    let mut frame = Vec::with_capacity(lcd::HEADER_LEN + payload.len());
    frame.extend_from_slice(&lcd_header());
    frame.extend_from_slice(payload);
    Ok(frame)
}
