//! Logitech G13 USB identifiers, endpoints, and report constants.

#![deny(static_mut_refs)]

/// Logitech USB vendor ID.
pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// G13 gameboard product ID.
pub const G13_PRODUCT_ID: u16 = 0xC21C;

/// Interface carrying the input endpoint and the LCD endpoint.
pub const INTERFACE: u8 = 0;

/// Length of one polled input report.
pub const INPUT_REPORT_LEN: usize = 8;

/// Endpoint addresses.
pub mod endpoints {
    /// Interrupt IN endpoint for input reports.
    pub const INPUT: u8 = 0x81;
    /// Interrupt OUT endpoint for LCD frames.
    pub const LCD: u8 = 0x02;
}

/// First byte of each output report.
pub mod report_ids {
    /// LCD frame header.
    pub const LCD: u8 = 0x03;
    /// M-key LED mask.
    pub const LEDS: u8 = 0x05;
    /// RGB backlight.
    pub const BACKLIGHT: u8 = 0x07;
}

/// HID class `SET_REPORT` control transfer parameters.
pub mod control {
    /// Host-to-device, class request, interface recipient.
    pub const REQUEST_TYPE: u8 = 0x21;
    /// `SET_REPORT`.
    pub const SET_REPORT: u8 = 0x09;
    /// Feature report 0x05 (LEDs).
    pub const LEDS_VALUE: u16 = 0x0305;
    /// Feature report 0x07 (backlight).
    pub const BACKLIGHT_VALUE: u16 = 0x0307;
    /// Interface index.
    pub const INDEX: u16 = 0;
}

/// LCD geometry.
pub mod lcd {
    /// Visible width in pixels.
    pub const WIDTH: u32 = 160;
    /// Height in pixels (six bands of eight rows).
    pub const HEIGHT: u32 = 48;
    /// Fixed frame header length preceding the packed bitmap.
    pub const HEADER_LEN: usize = 32;
    /// Packed payload length (`WIDTH * HEIGHT / 8`).
    pub const PAYLOAD_LEN: usize = (WIDTH as usize) * (HEIGHT as usize) / 8;
}

/// Number of LEDs controlled by the LED report (M1, M2, M3, MR).
pub const LED_COUNT: usize = 4;
