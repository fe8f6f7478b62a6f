//! Top-level error enum and classification shared by every G13 crate.

use core::fmt;

use crate::{DeviceError, TransportError};

/// Top-level error type wrapping every G13 sub-error.
#[derive(Debug, thiserror::Error)]
pub enum G13Error {
    /// Startup errors: discovery, privilege drop, configuration
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Runtime transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl G13Error {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            G13Error::Device(_) => ErrorCategory::Device,
            G13Error::Transport(_) => ErrorCategory::Transport,
            G13Error::Io(_) => ErrorCategory::IO,
            G13Error::Config(_) => ErrorCategory::Config,
            G13Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            G13Error::Device(e) => e.severity(),
            G13Error::Transport(e) => e.severity(),
            G13Error::Io(_) => ErrorSeverity::Error,
            G13Error::Config(_) => ErrorSeverity::Error,
            G13Error::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        G13Error::Config(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        G13Error::Other(msg.into())
    }
}

impl From<std::io::Error> for G13Error {
    fn from(e: std::io::Error) -> Self {
        G13Error::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Startup and hardware errors
    Device = 1,
    /// Runtime transport errors
    Transport = 2,
    /// Configuration errors
    Config = 3,
    /// I/O errors
    IO = 4,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the read loop or startup must stop
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Device.to_string(), "Device");
        assert_eq!(ErrorCategory::Transport.to_string(), "Transport");
        assert_eq!(ErrorCategory::IO.to_string(), "IO");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_g13_error_category() {
        let err: G13Error = TransportError::Closed.into();
        assert_eq!(err.category(), ErrorCategory::Transport);

        let err = G13Error::config("bad threshold");
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_startup_errors_are_not_recoverable() {
        let err: G13Error = DeviceError::not_found(0x046d, 0xc21c).into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: G13Error = io.into();
        assert_eq!(err.category(), ErrorCategory::IO);
        assert!(err.is_recoverable());
    }
}
