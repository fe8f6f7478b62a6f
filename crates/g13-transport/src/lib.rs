//! USB transport for the Logitech G13.
//!
//! One dedicated worker thread owns the live device handle and performs
//! every blocking USB call. The rest of the process talks to it through two
//! unbounded FIFO queues: outbound commands (LEDs, backlight, LCD frames,
//! stop) and inbound results (reports or transport errors).
//!
//! Bringing the device up is a fixed sequence, each step fatal on failure:
//! locate, detach the kernel driver, drop root privileges, configure. See
//! [`startup::bring_up`].
//!
//! Hardware access goes through the [`UsbBackend`] trait so the worker can be
//! exercised against [`mock::MockUsbBackend`] without a device attached.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod budget;
pub mod command;
pub mod mock;
pub mod privilege;
pub mod rusb_backend;
pub mod settings;
pub mod startup;
pub mod transport;
mod worker;

pub use backend::{UsbBackend, UsbError};
pub use budget::ErrorBudget;
pub use command::Command;
pub use privilege::{PrivilegeDrop, SystemPrivileges};
pub use rusb_backend::{RusbBackend, RusbDevice, RusbProbe};
pub use settings::TransportSettings;
pub use startup::{DeviceCandidate, DeviceProbe, bring_up};
pub use transport::G13Transport;

/// What the worker pushes onto the inbound queue.
pub type Inbound = Result<hid_g13_protocol::RawReport, g13_errors::TransportError>;
