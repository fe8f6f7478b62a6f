//! Scripted in-memory device for tests.
//!
//! A [`MockUsbBackend`] is a cheap handle onto shared state: clone it, hand
//! one copy to the code under test, and keep the other to script reads and
//! inspect what was written.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use g13_errors::DeviceError;
use parking_lot::Mutex;

use crate::backend::{UsbBackend, UsbError};
use crate::privilege::PrivilegeDrop;
use crate::startup::{DeviceCandidate, DeviceProbe};

/// A device-side effect recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Control { value: u16, data: Vec<u8> },
    Display(Vec<u8>),
    Reset,
    Close,
}

/// A startup step recorded by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    Find,
    Open,
    DetachKernelDriver,
    DropPrivileges,
    Configure,
}

#[derive(Debug, Clone)]
enum MockRead {
    Report(Vec<u8>),
    Error(UsbError),
}

#[derive(Debug, Default)]
struct MockState {
    reads: VecDeque<MockRead>,
    ops: Vec<MockOp>,
    steps: Vec<StartupStep>,
    kernel_driver: bool,
    fail_configure: bool,
    write_errors: VecDeque<UsbError>,
    close_delay: Duration,
    panic_on_close: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockUsbBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockUsbBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernel_driver(self, attached: bool) -> Self {
        self.state.lock().kernel_driver = attached;
        self
    }

    pub fn failing_configure(self) -> Self {
        self.state.lock().fail_configure = true;
        self
    }

    /// Make `close` block, to exercise the shutdown bound.
    pub fn with_close_delay(self, delay: Duration) -> Self {
        self.state.lock().close_delay = delay;
        self
    }

    pub fn panicking_on_close(self) -> Self {
        self.state.lock().panic_on_close = true;
        self
    }

    /// Queue bytes for the next read. Shorter than a report is malformed.
    pub fn queue_report(&self, bytes: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .reads
            .push_back(MockRead::Report(bytes.into()));
    }

    pub fn queue_error(&self, error: UsbError) {
        self.state.lock().reads.push_back(MockRead::Error(error));
    }

    /// Fail the next write (control or display) with `error`.
    pub fn fail_next_write(&self, error: UsbError) {
        self.state.lock().write_errors.push_back(error);
    }

    pub fn pending_reads(&self) -> usize {
        self.state.lock().reads.len()
    }

    pub fn ops(&self) -> Vec<MockOp> {
        self.state.lock().ops.clone()
    }

    pub fn startup_steps(&self) -> Vec<StartupStep> {
        self.state.lock().steps.clone()
    }

    pub fn reset_count(&self) -> usize {
        self.count(|op| matches!(op, MockOp::Reset))
    }

    pub fn close_count(&self) -> usize {
        self.count(|op| matches!(op, MockOp::Close))
    }

    pub fn control_writes(&self) -> Vec<(u16, Vec<u8>)> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                MockOp::Control { value, data } => Some((*value, data.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn display_writes(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                MockOp::Display(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&MockOp) -> bool) -> usize {
        self.state.lock().ops.iter().filter(|op| predicate(*op)).count()
    }

    fn record_step(&self, step: StartupStep) {
        self.state.lock().steps.push(step);
    }

    fn record_write(&self, op: MockOp) -> Result<(), UsbError> {
        let mut state = self.state.lock();
        if let Some(error) = state.write_errors.pop_front() {
            return Err(error);
        }
        state.ops.push(op);
        Ok(())
    }
}

impl UsbBackend for MockUsbBackend {
    fn read_input(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError> {
        let next = self.state.lock().reads.pop_front();
        match next {
            Some(MockRead::Report(bytes)) => {
                let n = bytes.len().min(buf.len());
                for (dst, src) in buf.iter_mut().zip(&bytes) {
                    *dst = *src;
                }
                Ok(n)
            }
            Some(MockRead::Error(error)) => Err(error),
            None => {
                thread::sleep(timeout);
                Err(UsbError::Timeout)
            }
        }
    }

    fn write_control(&mut self, value: u16, data: &[u8]) -> Result<(), UsbError> {
        self.record_write(MockOp::Control {
            value,
            data: data.to_vec(),
        })
    }

    fn write_display(&mut self, frame: &[u8]) -> Result<(), UsbError> {
        self.record_write(MockOp::Display(frame.to_vec()))
    }

    fn reset(&mut self) -> Result<(), UsbError> {
        self.state.lock().ops.push(MockOp::Reset);
        Ok(())
    }

    #[expect(clippy::panic, reason = "scripted worker failure for tests")]
    fn close(&mut self) {
        let (delay, panic_on_close) = {
            let state = self.state.lock();
            (state.close_delay, state.panic_on_close)
        };
        if panic_on_close {
            panic!("mock close failure");
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.state.lock().ops.push(MockOp::Close);
    }
}

impl DeviceCandidate for MockUsbBackend {
    type Backend = MockUsbBackend;

    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        self.record_step(StartupStep::Open);
        Ok(())
    }

    fn detach_kernel_driver(&mut self, _interface: u8) -> Result<bool, DeviceError> {
        if !self.state.lock().kernel_driver {
            return Ok(false);
        }
        self.record_step(StartupStep::DetachKernelDriver);
        self.state.lock().kernel_driver = false;
        Ok(true)
    }

    fn configure(self, _interface: u8) -> Result<MockUsbBackend, DeviceError> {
        if self.state.lock().fail_configure {
            return Err(DeviceError::Configuration("mock configure failure".into()));
        }
        self.record_step(StartupStep::Configure);
        Ok(self)
    }
}

/// Probe that "finds" a fixed list of mock devices.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    devices: Vec<MockUsbBackend>,
}

impl MockProbe {
    pub fn with_devices(devices: Vec<MockUsbBackend>) -> Self {
        Self { devices }
    }
}

impl DeviceProbe for MockProbe {
    type Candidate = MockUsbBackend;

    fn find(&mut self, _vendor_id: u16, _product_id: u16) -> Result<Vec<MockUsbBackend>, DeviceError> {
        for device in &self.devices {
            device.record_step(StartupStep::Find);
        }
        Ok(self.devices.clone())
    }
}

/// Privilege drop that only records itself.
#[derive(Debug, Clone, Default)]
pub struct MockPrivileges {
    device: Option<MockUsbBackend>,
    fail: bool,
}

impl MockPrivileges {
    /// Record the drop in `device`'s step log.
    pub fn new(device: &MockUsbBackend) -> Self {
        Self {
            device: Some(device.clone()),
            fail: false,
        }
    }

    /// A drop not tied to any device log.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl PrivilegeDrop for MockPrivileges {
    fn drop_privileges(&mut self) -> Result<(), DeviceError> {
        if self.fail {
            return Err(DeviceError::privilege("mock: still root"));
        }
        if let Some(device) = &self.device {
            device.record_step(StartupStep::DropPrivileges);
        }
        Ok(())
    }
}
