//! Transport tuning knobs.

use std::time::Duration;

use hid_g13_protocol::ids::{G13_PRODUCT_ID, INTERFACE, LOGITECH_VENDOR_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    /// Bound on each input read; also the worst-case latency for outbound
    /// commands
    pub read_timeout: Duration,
    /// Timeout for control and LCD writes
    pub write_timeout: Duration,
    /// How long `close()` waits for the worker's acknowledgement
    pub shutdown_timeout: Duration,
    /// Quiet period after open before the first input read. Outbound
    /// commands are still served while it runs.
    pub settle_delay: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            vendor_id: LOGITECH_VENDOR_ID,
            product_id: G13_PRODUCT_ID,
            interface: INTERFACE,
            read_timeout: Duration::from_millis(10),
            write_timeout: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_millis(500),
        }
    }
}
