//! Logitech G13 protocol: report parsing, keycode table, and LCD encoding.
//!
//! This crate is intentionally I/O-free. It provides pure functions and
//! types that can be tested without hardware; the transport and the
//! decoder build on top of it.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod bitmap;
pub mod ids;
pub mod input;
pub mod keycodes;
pub mod output;
pub mod types;

pub use bitmap::{MonoBitmap, pack_bands, packed_len, unpack_bands};
pub use ids::{G13_PRODUCT_ID, LOGITECH_VENDOR_ID};
pub use input::RawReport;
pub use keycodes::{KeyLocation, KeycodeEntry, KeycodeTable};
pub use output::{
    BACKLIGHT_REPORT_LEN, LED_REPORT_LEN, build_backlight_report, build_lcd_frame,
    build_led_report, lcd_header, led_mask,
};
pub use types::{Axis, Zone, ZoneThresholds};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed report: expected {expected} bytes, got {actual}")]
    MalformedReport { expected: usize, actual: usize },

    #[error("Invalid bitmap dimensions {width}x{height}: height must be a multiple of 8")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid payload: expected {expected} bytes, got {actual}")]
    InvalidPayload { expected: usize, actual: usize },

    #[error("Invalid keycode table: {0}")]
    InvalidKeycodeTable(String),

    #[error("Invalid zone thresholds: {0}")]
    InvalidThresholds(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
