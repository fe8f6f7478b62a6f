//! Caller-facing transport handle.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use g13_errors::{G13Error, TransportError, TransportResult};
use hid_g13_protocol::RawReport;
use tracing::{debug, error, info, warn};

use crate::Inbound;
use crate::backend::UsbBackend;
use crate::command::Command;
use crate::privilege::SystemPrivileges;
use crate::rusb_backend::RusbProbe;
use crate::settings::TransportSettings;
use crate::startup::bring_up;
use crate::worker::Worker;

/// Non-blocking handle onto the USB worker.
///
/// Every method returns immediately; the worker performs the actual I/O.
/// `close` is the only blocking call and is bounded by
/// [`TransportSettings::shutdown_timeout`].
pub struct G13Transport {
    commands: Option<Sender<Command>>,
    reports: Receiver<Inbound>,
    worker: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl G13Transport {
    /// Bring up the real device and start the worker.
    pub fn open(settings: &TransportSettings) -> Result<Self, G13Error> {
        let mut probe = RusbProbe::new(settings.write_timeout)?;
        let backend = bring_up(&mut probe, &mut SystemPrivileges, settings)?;
        Ok(Self::spawn(backend, settings)?)
    }

    /// Start a worker thread that takes exclusive ownership of `backend`.
    pub fn spawn<B>(backend: B, settings: &TransportSettings) -> TransportResult<Self>
    where
        B: UsbBackend + 'static,
    {
        let (command_tx, command_rx) = channel::unbounded();
        let (report_tx, report_rx) = channel::unbounded();

        let worker = Worker::new(
            backend,
            command_rx,
            report_tx,
            settings.read_timeout,
            settings.settle_delay,
        );
        let handle = thread::Builder::new()
            .name("g13-usb".to_string())
            .spawn(move || worker.run())
            .map_err(|e| TransportError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            commands: Some(command_tx),
            reports: report_rx,
            worker: Some(handle),
            shutdown_timeout: settings.shutdown_timeout,
        })
    }

    /// Take the next inbound item without blocking.
    ///
    /// `Ok(None)` means no report arrived since the last poll.
    pub fn poll_read(&self) -> TransportResult<Option<RawReport>> {
        if self.commands.is_none() {
            return Err(TransportError::Closed);
        }
        match self.reports.try_recv() {
            Ok(Ok(report)) => Ok(Some(report)),
            Ok(Err(e)) => Err(e),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    pub fn enqueue_set_leds(&self, mask: u8) -> TransportResult<()> {
        self.enqueue(Command::SetLeds(mask))
    }

    pub fn enqueue_set_backlight(&self, r: u8, g: u8, b: u8) -> TransportResult<()> {
        self.enqueue(Command::SetBacklight { r, g, b })
    }

    /// Queue a packed LCD payload (the header is added by the worker).
    pub fn enqueue_set_display(&self, payload: Vec<u8>) -> TransportResult<()> {
        self.enqueue(Command::SetDisplay(payload))
    }

    pub fn is_open(&self) -> bool {
        self.commands.is_some()
    }

    /// Stop the worker, reset the device, and release it.
    ///
    /// Blocks until the worker acknowledges or the shutdown bound expires.
    /// A second call is a no-op.
    ///
    /// # Errors
    ///
    /// [`TransportError::ShutdownTimeout`] if the worker does not acknowledge
    /// in time. [`TransportError::WorkerPanicked`] only when panics unwind:
    /// the dev and release profiles set `panic = "abort"`, so there a worker
    /// panic ends the process before `close` can observe it.
    pub fn close(&mut self) -> TransportResult<()> {
        let Some(commands) = self.commands.take() else {
            return Ok(());
        };
        info!("Closing G13 transport");

        let (ack_tx, ack_rx) = channel::bounded(1);
        if commands.send(Command::Stop(ack_tx)).is_err() {
            warn!("Worker already gone before stop");
            return self.join_worker();
        }

        match ack_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) => self.join_worker(),
            Err(RecvTimeoutError::Timeout) => {
                let timeout_ms = u64::try_from(self.shutdown_timeout.as_millis()).unwrap_or(u64::MAX);
                error!(timeout_ms, "USB worker did not acknowledge shutdown");
                // Leave the thread detached; joining could block forever.
                self.worker = None;
                Err(TransportError::ShutdownTimeout { timeout_ms })
            }
            Err(RecvTimeoutError::Disconnected) => self.join_worker(),
        }
    }

    fn enqueue(&self, command: Command) -> TransportResult<()> {
        let Some(commands) = &self.commands else {
            return Err(TransportError::Closed);
        };
        commands.send(command).map_err(|e| {
            debug!(command = e.0.name(), "Worker gone, command dropped");
            TransportError::Closed
        })
    }

    fn join_worker(&mut self) -> TransportResult<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(()) => {
                info!("G13 transport closed");
                Ok(())
            }
            Err(_) => {
                error!("USB worker panicked");
                Err(TransportError::WorkerPanicked)
            }
        }
    }
}

impl Drop for G13Transport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("G13 transport dropped while open - closing");
            if let Err(e) = self.close() {
                error!(error = %e, "Close during drop failed");
            }
        }
    }
}
