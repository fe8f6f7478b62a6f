//! libusb-backed implementation of the startup and backend traits.

use std::time::Duration;

use g13_errors::DeviceError;
use hid_g13_protocol::ids::{control, endpoints};
use rusb::{Context, Device, DeviceHandle, UsbContext};
use tracing::{debug, warn};

use crate::backend::{UsbBackend, UsbError};
use crate::startup::{DeviceCandidate, DeviceProbe};

impl From<rusb::Error> for UsbError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Timeout => UsbError::Timeout,
            rusb::Error::Pipe => UsbError::Pipe,
            rusb::Error::Io => UsbError::Io,
            other => UsbError::Other(other.to_string()),
        }
    }
}

/// Enumerates the bus through a private libusb context.
pub struct RusbProbe {
    context: Context,
    write_timeout: Duration,
}

impl RusbProbe {
    pub fn new(write_timeout: Duration) -> Result<Self, DeviceError> {
        let context = Context::new()
            .map_err(|e| DeviceError::Open(format!("libusb init failed: {e}")))?;
        Ok(Self {
            context,
            write_timeout,
        })
    }
}

impl DeviceProbe for RusbProbe {
    type Candidate = RusbDevice;

    fn find(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<RusbDevice>, DeviceError> {
        let devices = self
            .context
            .devices()
            .map_err(|e| DeviceError::Open(format!("device enumeration failed: {e}")))?;

        let mut found = Vec::new();
        for device in devices.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!(error = %e, "Skipping device with unreadable descriptor");
                    continue;
                }
            };
            if descriptor.vendor_id() == vendor_id && descriptor.product_id() == product_id {
                found.push(RusbDevice {
                    device,
                    handle: None,
                    write_timeout: self.write_timeout,
                });
            }
        }
        Ok(found)
    }
}

/// One matching device on the bus, opened lazily.
pub struct RusbDevice {
    device: Device<Context>,
    handle: Option<DeviceHandle<Context>>,
    write_timeout: Duration,
}

impl RusbDevice {
    fn handle_mut(&mut self) -> Result<&mut DeviceHandle<Context>, DeviceError> {
        self.handle
            .as_mut()
            .ok_or_else(|| DeviceError::Open("device used before open".to_string()))
    }
}

impl DeviceCandidate for RusbDevice {
    type Backend = RusbBackend;

    fn describe(&self) -> String {
        format!(
            "bus {:03} address {:03}",
            self.device.bus_number(),
            self.device.address()
        )
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        let handle = self
            .device
            .open()
            .map_err(|e| DeviceError::Open(e.to_string()))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<bool, DeviceError> {
        let handle = self.handle_mut()?;
        match handle.kernel_driver_active(interface) {
            Ok(true) => {
                handle
                    .detach_kernel_driver(interface)
                    .map_err(|e| DeviceError::kernel_driver(interface, e.to_string()))?;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(rusb::Error::NotSupported) => {
                debug!("Kernel driver query not supported on this platform");
                Ok(false)
            }
            Err(e) => Err(DeviceError::kernel_driver(interface, e.to_string())),
        }
    }

    fn configure(mut self, interface: u8) -> Result<RusbBackend, DeviceError> {
        let configuration = self
            .device
            .config_descriptor(0)
            .map_err(|e| DeviceError::Configuration(format!("no configuration: {e}")))?
            .number();

        let mut handle = self
            .handle
            .take()
            .ok_or_else(|| DeviceError::Open("device used before open".to_string()))?;
        handle
            .set_active_configuration(configuration)
            .map_err(|e| DeviceError::Configuration(format!("set configuration: {e}")))?;
        handle
            .claim_interface(interface)
            .map_err(|e| DeviceError::Configuration(format!("claim interface: {e}")))?;

        Ok(RusbBackend {
            handle,
            interface,
            write_timeout: self.write_timeout,
        })
    }
}

/// A configured G13 behind a libusb handle.
pub struct RusbBackend {
    handle: DeviceHandle<Context>,
    interface: u8,
    write_timeout: Duration,
}

impl UsbBackend for RusbBackend {
    fn read_input(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError> {
        Ok(self.handle.read_interrupt(endpoints::INPUT, buf, timeout)?)
    }

    fn write_control(&mut self, value: u16, data: &[u8]) -> Result<(), UsbError> {
        self.handle.write_control(
            control::REQUEST_TYPE,
            control::SET_REPORT,
            value,
            control::INDEX,
            data,
            self.write_timeout,
        )?;
        Ok(())
    }

    fn write_display(&mut self, frame: &[u8]) -> Result<(), UsbError> {
        let written = self
            .handle
            .write_interrupt(endpoints::LCD, frame, self.write_timeout)?;
        if written != frame.len() {
            warn!(written, expected = frame.len(), "Short LCD write");
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), UsbError> {
        Ok(self.handle.reset()?)
    }

    fn close(&mut self) {
        if let Err(e) = self.handle.release_interface(self.interface) {
            debug!(error = %e, "Release interface failed during close");
        }
    }
}
