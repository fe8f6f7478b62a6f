//! Device bring-up sequence.
//!
//! The order is fixed and every step is fatal on failure:
//!
//! 1. locate exactly one device by vendor/product id
//! 2. open it and detach any kernel driver bound to the interface
//! 3. drop root privileges
//! 4. apply the configuration and claim the interface
//!
//! Nothing is read or written before privileges are gone.

use g13_errors::DeviceError;
use tracing::info;

use crate::backend::UsbBackend;
use crate::privilege::PrivilegeDrop;
use crate::settings::TransportSettings;

/// Enumerates devices on the bus.
pub trait DeviceProbe {
    type Candidate: DeviceCandidate;

    fn find(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Vec<Self::Candidate>, DeviceError>;
}

/// A device that matched the identifiers but is not yet usable.
pub trait DeviceCandidate {
    type Backend: UsbBackend;

    /// Human readable location for logs.
    fn describe(&self) -> String;

    fn open(&mut self) -> Result<(), DeviceError>;

    /// Detach a bound kernel driver. Returns whether one was detached.
    fn detach_kernel_driver(&mut self, interface: u8) -> Result<bool, DeviceError>;

    /// Apply the sole configuration and claim the interface.
    fn configure(self, interface: u8) -> Result<Self::Backend, DeviceError>;
}

/// Run the startup sequence and hand back a ready backend.
pub fn bring_up<P, D>(
    probe: &mut P,
    privileges: &mut D,
    settings: &TransportSettings,
) -> Result<<P::Candidate as DeviceCandidate>::Backend, DeviceError>
where
    P: DeviceProbe,
    D: PrivilegeDrop,
{
    let mut candidates = probe.find(settings.vendor_id, settings.product_id)?;
    if candidates.len() > 1 {
        return Err(DeviceError::ambiguous(
            settings.vendor_id,
            settings.product_id,
            candidates.len(),
        ));
    }
    let Some(mut device) = candidates.pop() else {
        return Err(DeviceError::not_found(
            settings.vendor_id,
            settings.product_id,
        ));
    };
    info!(device = %device.describe(), "Found G13");

    device.open()?;
    if device.detach_kernel_driver(settings.interface)? {
        info!(interface = settings.interface, "Detached kernel driver");
    }

    privileges.drop_privileges()?;

    let backend = device.configure(settings.interface)?;
    info!(interface = settings.interface, "G13 initialised");
    Ok(backend)
}
