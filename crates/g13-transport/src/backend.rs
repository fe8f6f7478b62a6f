//! Hardware seam between the worker and libusb.

use std::time::Duration;

/// Classified USB failure.
///
/// Only the distinctions the worker acts on are kept: a timeout is "no
/// data", a pipe or I/O fault is recovered by resetting the device, and
/// everything else is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsbError {
    #[error("operation timed out")]
    Timeout,

    #[error("pipe error")]
    Pipe,

    #[error("input/output error")]
    Io,

    #[error("{0}")]
    Other(String),
}

impl UsbError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, UsbError::Pipe | UsbError::Io)
    }
}

/// A configured, claimed G13 ready for data exchange.
///
/// Implementations are moved into the worker thread and never touched from
/// anywhere else.
pub trait UsbBackend: Send {
    /// Read one interrupt report from the input endpoint.
    fn read_input(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError>;

    /// Class/interface SET_REPORT control transfer.
    fn write_control(&mut self, value: u16, data: &[u8]) -> Result<(), UsbError>;

    /// Write a complete LCD frame (header plus payload) to the LCD endpoint.
    fn write_display(&mut self, frame: &[u8]) -> Result<(), UsbError>;

    fn reset(&mut self) -> Result<(), UsbError>;

    /// Release the claimed interface and any other OS resources.
    fn close(&mut self);
}

impl<B: UsbBackend + ?Sized> UsbBackend for Box<B> {
    fn read_input(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError> {
        (**self).read_input(buf, timeout)
    }

    fn write_control(&mut self, value: u16, data: &[u8]) -> Result<(), UsbError> {
        (**self).write_control(value, data)
    }

    fn write_display(&mut self, frame: &[u8]) -> Result<(), UsbError> {
        (**self).write_display(frame)
    }

    fn reset(&mut self) -> Result<(), UsbError> {
        (**self).reset()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
