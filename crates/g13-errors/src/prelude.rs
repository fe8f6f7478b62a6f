//! Prelude module for convenient error handling imports.

pub use crate::{
    Result, TransportResult,
    common::{ErrorCategory, ErrorSeverity, G13Error},
    device::{DeviceError, TransportError},
};
