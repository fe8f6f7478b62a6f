//! Centralized error types for the G13 driver
//!
//! # Architecture
//!
//! - [`common`]: top-level [`G13Error`] plus severity and category classification
//! - [`device`]: startup errors ([`DeviceError`]) and runtime transport errors
//!   ([`TransportError`])
//!
//! Startup errors are always fatal: the driver never runs in a degraded
//! mode. Transport errors carry their own classification so a supervisor can
//! decide whether to keep polling.
//!
//! # Example
//!
//! ```
//! use g13_errors::prelude::*;
//!
//! fn locate(candidates: usize) -> Result<()> {
//!     match candidates {
//!         0 => Err(DeviceError::not_found(0x046d, 0xc21c).into()),
//!         1 => Ok(()),
//!         n => Err(DeviceError::ambiguous(0x046d, 0xc21c, n).into()),
//!     }
//! }
//!
//! assert!(locate(1).is_ok());
//! assert!(locate(2).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod device;
pub mod prelude;

pub use common::{ErrorCategory, ErrorSeverity, G13Error};
pub use device::{DeviceError, TransportError};

/// A specialized `Result` type for G13 driver operations.
pub type Result<T> = std::result::Result<T, G13Error>;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T = ()> = std::result::Result<T, TransportError>;
