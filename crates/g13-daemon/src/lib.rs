//! G13 userspace driver daemon.
//!
//! Wires the transport, decoder, and display crates into one cooperative
//! loop ([`G13Service`]) with configuration loading and logging setup for
//! the `g13d` binary.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

pub use config::DaemonConfig;
pub use service::{CoreCommand, CoreEvent, G13Service, ServiceHandle, ServiceTiming, StopReason};
