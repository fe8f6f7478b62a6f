//! Device startup and transport runtime errors.
//!
//! [`DeviceError`] covers everything that can go wrong while bringing the
//! device up. Every variant is fatal: startup aborts and nothing runs
//! privileged or half-configured.
//!
//! [`TransportError`] is what the worker pushes onto the inbound queue and
//! what `close()` reports. Timeouts never appear here; a timed-out read is
//! simply "no data".

use crate::common::ErrorSeverity;

/// Startup errors. All of them abort initialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No device matched the vendor/product pair
    #[error("Device not found: vendor={vendor_id:#06x}, product={product_id:#06x}")]
    NotFound {
        /// USB vendor ID
        vendor_id: u16,
        /// USB product ID
        product_id: u16,
    },

    /// More than one device matched and the choice would be arbitrary
    #[error(
        "Ambiguous device match: {count} devices with vendor={vendor_id:#06x}, product={product_id:#06x}"
    )]
    Ambiguous {
        /// USB vendor ID
        vendor_id: u16,
        /// USB product ID
        product_id: u16,
        /// Number of matching devices
        count: usize,
    },

    /// The process could not shed root privileges
    #[error("Failed to drop privileges: {0}")]
    PrivilegeDropFailed(String),

    /// Detaching the kernel driver failed
    #[error("Failed to detach kernel driver from interface {interface}: {reason}")]
    KernelDriver {
        /// Interface number
        interface: u8,
        /// Failure reason
        reason: String,
    },

    /// Setting the configuration or claiming the interface failed
    #[error("Failed to configure device: {0}")]
    Configuration(String),

    /// Opening the device or enumerating the bus failed
    #[error("Failed to open device: {0}")]
    Open(String),
}

impl DeviceError {
    /// Get the error severity. Startup failures are always critical.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }

    /// Check if this error means no usable device exists.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            DeviceError::NotFound { .. } | DeviceError::Ambiguous { .. }
        )
    }

    /// Create a not found error.
    pub fn not_found(vendor_id: u16, product_id: u16) -> Self {
        DeviceError::NotFound {
            vendor_id,
            product_id,
        }
    }

    /// Create an ambiguous match error.
    pub fn ambiguous(vendor_id: u16, product_id: u16, count: usize) -> Self {
        DeviceError::Ambiguous {
            vendor_id,
            product_id,
            count,
        }
    }

    /// Create a privilege drop error.
    pub fn privilege(reason: impl Into<String>) -> Self {
        DeviceError::PrivilegeDropFailed(reason.into())
    }

    /// Create a kernel driver detach error.
    pub fn kernel_driver(interface: u8, reason: impl Into<String>) -> Self {
        DeviceError::KernelDriver {
            interface,
            reason: reason.into(),
        }
    }
}

/// Runtime transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Pipe or I/O fault; the worker already reset the device
    #[error("Recoverable I/O error (device reset): {0}")]
    RecoverableIo(String),

    /// Unclassified USB error; the read loop must stop
    #[error("Fatal transport error: {0}")]
    Fatal(String),

    /// A report shorter than the fixed report length was dropped
    #[error("Malformed report dropped: expected {expected} bytes, got {actual}")]
    MalformedReport {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// The worker did not acknowledge stop within the bound
    #[error("Worker did not acknowledge shutdown within {timeout_ms}ms")]
    ShutdownTimeout {
        /// Shutdown bound in milliseconds
        timeout_ms: u64,
    },

    /// The worker thread panicked (observable only when panics unwind)
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// The transport is closed or the worker is gone
    #[error("Transport is closed")]
    Closed,

    /// The worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

impl TransportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TransportError::RecoverableIo(_) => ErrorSeverity::Error,
            TransportError::Fatal(_) => ErrorSeverity::Critical,
            TransportError::MalformedReport { .. } => ErrorSeverity::Warning,
            TransportError::ShutdownTimeout { .. } => ErrorSeverity::Critical,
            TransportError::WorkerPanicked => ErrorSeverity::Critical,
            TransportError::Closed => ErrorSeverity::Error,
            TransportError::WorkerSpawn(_) => ErrorSeverity::Critical,
        }
    }

    /// Check if the read loop may keep polling after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::RecoverableIo(_) | TransportError::MalformedReport { .. }
        )
    }

    /// Check if this error is charged against the supervisor's retry budget.
    pub fn counts_toward_budget(&self) -> bool {
        matches!(self, TransportError::RecoverableIo(_))
    }

    /// Create a recoverable I/O error.
    pub fn recoverable(reason: impl Into<String>) -> Self {
        TransportError::RecoverableIo(reason.into())
    }

    /// Create a fatal error.
    pub fn fatal(reason: impl Into<String>) -> Self {
        TransportError::Fatal(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::not_found(0x046d, 0xc21c);
        let msg = err.to_string();
        assert!(msg.contains("046d"));
        assert!(msg.contains("c21c"));
    }

    #[test]
    fn test_device_error_is_device_unavailable() {
        assert!(DeviceError::not_found(1, 2).is_device_unavailable());
        assert!(DeviceError::ambiguous(1, 2, 3).is_device_unavailable());
        assert!(!DeviceError::privilege("setuid").is_device_unavailable());
    }

    #[test]
    fn test_transport_error_classification() {
        assert!(TransportError::recoverable("pipe").is_recoverable());
        assert!(TransportError::recoverable("pipe").counts_toward_budget());

        let malformed = TransportError::MalformedReport {
            expected: 8,
            actual: 2,
        };
        assert!(malformed.is_recoverable());
        assert!(!malformed.counts_toward_budget());

        assert!(!TransportError::fatal("stall").is_recoverable());
        assert_eq!(
            TransportError::fatal("stall").severity(),
            ErrorSeverity::Critical
        );
    }
}
