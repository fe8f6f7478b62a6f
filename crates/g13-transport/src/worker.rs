//! The thread that owns the device handle.

use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use g13_errors::TransportError;
use hid_g13_protocol::ids::{INPUT_REPORT_LEN, control};
use hid_g13_protocol::{RawReport, build_backlight_report, build_lcd_frame, build_led_report};
use tracing::{debug, error, info, trace, warn};

use crate::Inbound;
use crate::backend::{UsbBackend, UsbError};
use crate::command::Command;

enum Flow {
    Continue,
    Exit,
}

pub(crate) struct Worker<B: UsbBackend> {
    backend: B,
    commands: Receiver<Command>,
    inbound: Sender<Inbound>,
    read_timeout: Duration,
    settle_delay: Duration,
    /// Set after an unclassified error; reads stop until `Stop` arrives.
    failed: bool,
}

impl<B: UsbBackend> Worker<B> {
    pub(crate) fn new(
        backend: B,
        commands: Receiver<Command>,
        inbound: Sender<Inbound>,
        read_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            backend,
            commands,
            inbound,
            read_timeout,
            settle_delay,
            failed: false,
        }
    }

    pub(crate) fn run(mut self) {
        info!("USB worker started");
        if let Flow::Exit = self.settle() {
            info!("USB worker stopped");
            return;
        }
        loop {
            if let Flow::Exit = self.drain_commands() {
                break;
            }
            if self.failed {
                // Nothing more to read; park until told to stop.
                let flow = match self.commands.recv() {
                    Ok(command) => self.execute(command),
                    Err(_) => self.shutdown(None),
                };
                if let Flow::Exit = flow {
                    break;
                }
            } else {
                self.read_once();
            }
        }
        info!("USB worker stopped");
    }

    /// Serve commands without reading until the settle delay has passed.
    fn settle(&mut self) -> Flow {
        if self.settle_delay.is_zero() {
            return Flow::Continue;
        }
        debug!(settle = ?self.settle_delay, "Waiting for device to settle");
        let deadline = Instant::now() + self.settle_delay;
        loop {
            match self.commands.recv_deadline(deadline) {
                Ok(command) => {
                    if let Flow::Exit = self.execute(command) {
                        return Flow::Exit;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Device settled, starting reads");
                    return Flow::Continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command queue disconnected while settling");
                    return self.shutdown(None);
                }
            }
        }
    }

    fn drain_commands(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if let Flow::Exit = self.execute(command) {
                        return Flow::Exit;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => {
                    warn!("Command queue disconnected without stop");
                    return self.shutdown(None);
                }
            }
        }
    }

    fn execute(&mut self, command: Command) -> Flow {
        trace!(command = command.name(), "Executing command");
        let result = match command {
            Command::SetLeds(mask) => self
                .backend
                .write_control(control::LEDS_VALUE, &build_led_report(mask)),
            Command::SetBacklight { r, g, b } => self
                .backend
                .write_control(control::BACKLIGHT_VALUE, &build_backlight_report(r, g, b)),
            Command::SetDisplay(payload) => match build_lcd_frame(&payload) {
                Ok(frame) => self.backend.write_display(&frame),
                Err(e) => {
                    warn!(error = %e, "Dropping invalid display payload");
                    Ok(())
                }
            },
            Command::Stop(ack) => return self.shutdown(Some(ack)),
        };

        if let Err(e) = result {
            if self.failed {
                debug!(error = %e, "Write failed after fatal error");
            } else {
                self.handle_usb_error("write", e);
            }
        }
        Flow::Continue
    }

    fn read_once(&mut self) {
        let mut buf = [0u8; INPUT_REPORT_LEN];
        match self.backend.read_input(&mut buf, self.read_timeout) {
            Ok(n) => {
                let data = buf.get(..n).unwrap_or(buf.as_slice());
                match RawReport::parse(data) {
                    Ok(report) => {
                        trace!(%report, "Report");
                        self.push(Ok(report));
                    }
                    Err(e) => {
                        warn!(error = %e, "Dropping malformed report");
                        self.push(Err(TransportError::MalformedReport {
                            expected: INPUT_REPORT_LEN,
                            actual: n,
                        }));
                    }
                }
            }
            Err(e) => self.handle_usb_error("read", e),
        }
    }

    fn handle_usb_error(&mut self, operation: &'static str, e: UsbError) {
        match e {
            UsbError::Timeout if operation == "read" => {}
            UsbError::Timeout => warn!(operation, "USB write timed out"),
            UsbError::Pipe | UsbError::Io => {
                error!(operation, error = %e, "Recoverable USB error, resetting device");
                if let Err(reset_error) = self.backend.reset() {
                    error!(error = %reset_error, "Device reset failed");
                }
                self.push(Err(TransportError::recoverable(format!("{operation}: {e}"))));
            }
            UsbError::Other(ref reason) => {
                error!(operation, error = %reason, "Unclassified USB error");
                self.failed = true;
                self.push(Err(TransportError::fatal(format!("{operation}: {reason}"))));
            }
        }
    }

    fn shutdown(&mut self, ack: Option<Sender<()>>) -> Flow {
        info!("USB worker shutting down");
        if let Err(e) = self.backend.reset() {
            warn!(error = %e, "Device reset failed during shutdown");
        }
        self.backend.close();
        if let Some(ack) = ack
            && ack.send(()).is_err()
        {
            debug!("Shutdown acknowledgement had no listener");
        }
        Flow::Exit
    }

    fn push(&self, item: Inbound) {
        if self.inbound.send(item).is_err() {
            debug!("Inbound queue closed, dropping item");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOp, MockUsbBackend};
    use crossbeam::channel::unbounded;
    use tracing_test::traced_test;

    fn worker(mock: &MockUsbBackend) -> (Worker<MockUsbBackend>, Sender<Command>, Receiver<Inbound>) {
        settling_worker(mock, Duration::ZERO)
    }

    fn settling_worker(
        mock: &MockUsbBackend,
        settle: Duration,
    ) -> (Worker<MockUsbBackend>, Sender<Command>, Receiver<Inbound>) {
        let (command_tx, command_rx) = unbounded();
        let (inbound_tx, inbound_rx) = unbounded();
        let worker = Worker::new(mock.clone(), command_rx, inbound_tx, Duration::ZERO, settle);
        (worker, command_tx, inbound_rx)
    }

    #[test]
    fn test_timeout_yields_nothing() {
        let mock = MockUsbBackend::new();
        let (mut worker, _tx, rx) = worker(&mock);
        worker.read_once();
        assert!(rx.try_recv().is_err());
        assert_eq!(mock.reset_count(), 0);
    }

    #[test]
    fn test_pipe_error_resets_and_reports() {
        let mock = MockUsbBackend::new();
        mock.queue_error(UsbError::Pipe);
        let (mut worker, _tx, rx) = worker(&mock);

        worker.read_once();

        assert_eq!(mock.reset_count(), 1);
        assert!(matches!(rx.try_recv(), Ok(Err(TransportError::RecoverableIo(_)))));
    }

    #[test]
    fn test_unclassified_error_is_fatal() {
        let mock = MockUsbBackend::new();
        mock.queue_error(UsbError::Other("no device".into()));
        let (mut worker, _tx, rx) = worker(&mock);

        worker.read_once();

        assert!(worker.failed);
        assert_eq!(mock.reset_count(), 0);
        assert!(matches!(rx.try_recv(), Ok(Err(TransportError::Fatal(_)))));
    }

    #[test]
    fn test_short_report_is_dropped() {
        let mock = MockUsbBackend::new();
        mock.queue_report(vec![0, 0x80, 0x80]);
        let (mut worker, _tx, rx) = worker(&mock);

        worker.read_once();

        assert_eq!(
            rx.try_recv().ok(),
            Some(Err(TransportError::MalformedReport {
                expected: 8,
                actual: 3
            }))
        );
    }

    #[test]
    fn test_commands_drain_in_fifo_order() {
        let mock = MockUsbBackend::new();
        let (mut worker, tx, _rx) = worker(&mock);
        for command in [
            Command::SetLeds(0x01),
            Command::SetBacklight { r: 1, g: 2, b: 3 },
            Command::SetLeds(0x02),
        ] {
            assert!(tx.send(command).is_ok());
        }

        assert!(matches!(worker.drain_commands(), Flow::Continue));

        assert_eq!(
            mock.ops(),
            vec![
                MockOp::Control {
                    value: control::LEDS_VALUE,
                    data: vec![5, 1, 0, 0, 0]
                },
                MockOp::Control {
                    value: control::BACKLIGHT_VALUE,
                    data: vec![7, 1, 2, 3, 0]
                },
                MockOp::Control {
                    value: control::LEDS_VALUE,
                    data: vec![5, 2, 0, 0, 0]
                },
            ]
        );
    }

    #[test]
    fn test_invalid_display_payload_is_not_written() {
        let mock = MockUsbBackend::new();
        let (mut worker, tx, _rx) = worker(&mock);
        assert!(tx.send(Command::SetDisplay(vec![0; 10])).is_ok());
        worker.drain_commands();
        assert!(mock.display_writes().is_empty());
    }

    #[test]
    fn test_stop_resets_closes_and_acks() {
        let mock = MockUsbBackend::new();
        let (worker, tx, _rx) = worker(&mock);
        let (ack_tx, ack_rx) = unbounded();
        assert!(tx.send(Command::Stop(ack_tx)).is_ok());

        worker.run();

        assert_eq!(mock.ops(), vec![MockOp::Reset, MockOp::Close]);
        assert!(ack_rx.try_recv().is_ok());
    }

    #[test]
    #[traced_test]
    fn test_recoverable_error_is_logged() {
        let mock = MockUsbBackend::new();
        mock.queue_error(UsbError::Io);
        let (mut worker, _tx, _rx) = worker(&mock);

        worker.read_once();

        assert!(logs_contain("Recoverable USB error, resetting device"));
    }

    #[test]
    fn test_write_pipe_error_resets() {
        let mock = MockUsbBackend::new();
        mock.fail_next_write(UsbError::Pipe);
        let (mut worker, tx, rx) = worker(&mock);
        assert!(tx.send(Command::SetLeds(1)).is_ok());

        worker.drain_commands();

        assert_eq!(mock.reset_count(), 1);
        assert!(matches!(rx.try_recv(), Ok(Err(TransportError::RecoverableIo(_)))));
    }

    #[test]
    fn test_settle_serves_commands_without_reading() {
        let mock = MockUsbBackend::new();
        mock.queue_error(UsbError::Io);
        let (mut worker, tx, rx) = settling_worker(&mock, Duration::from_millis(20));
        assert!(tx.send(Command::SetLeds(0b0100)).is_ok());

        let started = Instant::now();
        assert!(matches!(worker.settle(), Flow::Continue));

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(mock.pending_reads(), 1);
        assert_eq!(mock.reset_count(), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            mock.control_writes(),
            vec![(control::LEDS_VALUE, vec![5, 0b0100, 0, 0, 0])]
        );
    }

    #[test]
    fn test_stop_while_settling_never_reads() {
        let mock = MockUsbBackend::new();
        mock.queue_report(vec![0, 0x80, 0x80, 0, 0, 0, 0, 0]);
        let (worker, tx, rx) = settling_worker(&mock, Duration::from_secs(10));
        let (ack_tx, ack_rx) = unbounded();
        assert!(tx.send(Command::Stop(ack_tx)).is_ok());

        worker.run();

        assert!(ack_rx.try_recv().is_ok());
        assert_eq!(mock.pending_reads(), 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(mock.ops(), vec![MockOp::Reset, MockOp::Close]);
    }
}
