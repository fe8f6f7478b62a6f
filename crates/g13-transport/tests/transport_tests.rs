//! End-to-end behaviour of `G13Transport` against the mock backend.

use std::time::Duration;

use g13_errors::TransportError;
use g13_test_helpers::prelude::*;
use g13_transport::mock::{MockOp, MockUsbBackend};
use g13_transport::{G13Transport, TransportSettings, UsbError};
use hid_g13_protocol::ids::{control, lcd};

const WAIT: Duration = Duration::from_secs(2);

fn settings() -> TransportSettings {
    TransportSettings {
        read_timeout: Duration::from_millis(1),
        shutdown_timeout: Duration::from_secs(2),
        settle_delay: Duration::ZERO,
        ..TransportSettings::default()
    }
}

fn next_item(transport: &G13Transport) -> Option<Result<hid_g13_protocol::RawReport, TransportError>> {
    poll_until(WAIT, || match transport.poll_read() {
        Ok(None) => None,
        Ok(Some(report)) => Some(Ok(report)),
        Err(e) => Some(Err(e)),
    })
}

#[test]
fn test_reports_arrive_in_read_order() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_report(vec![0, 0x80, 0x80, 0x01, 0, 0, 0, 0]);
    mock.queue_report(vec![0, 0x80, 0x80, 0x02, 0, 0, 0, 0]);
    let mut transport = G13Transport::spawn(mock.clone(), &settings())?;

    let first = must(must_some(next_item(&transport), "first report"));
    let second = must(must_some(next_item(&transport), "second report"));
    assert_eq!(first.as_bytes().get(3), Some(&0x01));
    assert_eq!(second.as_bytes().get(3), Some(&0x02));

    transport.close()?;
    Ok(())
}

#[test]
fn test_no_data_is_not_an_error() -> TestResult {
    let mock = MockUsbBackend::new();
    let mut transport = G13Transport::spawn(mock, &settings())?;
    assert_eq!(transport.poll_read(), Ok(None));
    transport.close()?;
    Ok(())
}

#[test]
fn test_outbound_commands_reach_device() -> TestResult {
    let mock = MockUsbBackend::new();
    let mut transport = G13Transport::spawn(mock.clone(), &settings())?;

    transport.enqueue_set_leds(0b1001)?;
    transport.enqueue_set_backlight(0x10, 0x20, 0xff)?;
    transport.enqueue_set_display(vec![0xAA; lcd::PAYLOAD_LEN])?;

    assert!(eventually(WAIT, || mock.ops().len() >= 3));
    assert_eq!(
        mock.control_writes(),
        vec![
            (control::LEDS_VALUE, vec![0x05, 0x09, 0, 0, 0]),
            (control::BACKLIGHT_VALUE, vec![0x07, 0x10, 0x20, 0xff, 0]),
        ]
    );
    let frames = mock.display_writes();
    assert_eq!(frames.len(), 1);
    let frame = must_some(frames.first(), "frame");
    assert_eq!(frame.len(), lcd::HEADER_LEN + lcd::PAYLOAD_LEN);
    assert_eq!(frame.first(), Some(&0x03));
    assert!(frame.iter().skip(1).take(lcd::HEADER_LEN - 1).all(|b| *b == 0));

    transport.close()?;
    Ok(())
}

#[test]
fn test_no_read_before_device_settles() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_error(UsbError::Io);
    let mut transport = G13Transport::spawn(
        mock.clone(),
        &TransportSettings {
            settle_delay: Duration::from_millis(300),
            ..settings()
        },
    )?;

    transport.enqueue_set_leds(0b0010)?;
    assert!(eventually(WAIT, || !mock.control_writes().is_empty()));
    assert_eq!(mock.pending_reads(), 1);
    assert_eq!(mock.reset_count(), 0);
    assert_eq!(transport.poll_read(), Ok(None));

    let item = must_some(next_item(&transport), "error after settling");
    assert!(matches!(item, Err(TransportError::RecoverableIo(_))));
    assert_eq!(mock.pending_reads(), 0);

    transport.close()?;
    Ok(())
}

#[test]
fn test_close_resets_and_releases_once() -> TestResult {
    let mock = MockUsbBackend::new();
    let mut transport = G13Transport::spawn(mock.clone(), &settings())?;

    transport.close()?;
    transport.close()?;

    assert_eq!(mock.reset_count(), 1);
    assert_eq!(mock.close_count(), 1);
    assert_eq!(mock.ops().last(), Some(&MockOp::Close));
    assert!(!transport.is_open());
    Ok(())
}

#[test]
fn test_drop_closes_open_transport() -> TestResult {
    let mock = MockUsbBackend::new();
    let transport = G13Transport::spawn(mock.clone(), &settings())?;
    drop(transport);
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[test]
fn test_use_after_close_is_rejected() -> TestResult {
    let mock = MockUsbBackend::new();
    let mut transport = G13Transport::spawn(mock, &settings())?;
    transport.close()?;

    assert_eq!(transport.enqueue_set_leds(1), Err(TransportError::Closed));
    assert_eq!(transport.poll_read(), Err(TransportError::Closed));
    Ok(())
}

#[test]
fn test_recoverable_error_is_surfaced_after_reset() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_error(UsbError::Pipe);
    let mut transport = G13Transport::spawn(mock.clone(), &settings())?;

    let item = must_some(next_item(&transport), "error item");
    assert!(matches!(item, Err(TransportError::RecoverableIo(_))));
    assert_eq!(mock.reset_count(), 1);

    transport.close()?;
    assert_eq!(mock.reset_count(), 2);
    Ok(())
}

#[test]
fn test_fatal_error_stops_reading() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_error(UsbError::Other("device vanished".into()));
    mock.queue_report(vec![0, 0x80, 0x80, 0, 0, 0, 0, 0]);
    let mut transport = G13Transport::spawn(mock.clone(), &settings())?;

    let item = must_some(next_item(&transport), "fatal item");
    assert!(matches!(item, Err(TransportError::Fatal(_))));

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(mock.pending_reads(), 1);
    assert_eq!(transport.poll_read(), Ok(None));

    transport.close()?;
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[test]
fn test_malformed_report_does_not_stop_the_worker() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_report(vec![0, 1]);
    mock.queue_report(vec![0, 0x80, 0x80, 0x10, 0, 0, 0, 0]);
    let mut transport = G13Transport::spawn(mock, &settings())?;

    let malformed = must_some(next_item(&transport), "malformed");
    assert_eq!(
        malformed,
        Err(TransportError::MalformedReport {
            expected: 8,
            actual: 2
        })
    );
    let report = must(must_some(next_item(&transport), "report"));
    assert_eq!(report.as_bytes().get(3), Some(&0x10));

    transport.close()?;
    Ok(())
}

#[test]
fn test_unacknowledged_stop_times_out() -> TestResult {
    let mock = MockUsbBackend::new().with_close_delay(Duration::from_millis(500));
    let mut transport = G13Transport::spawn(
        mock,
        &TransportSettings {
            shutdown_timeout: Duration::from_millis(20),
            ..settings()
        },
    )?;

    let result = transport.close();
    assert!(matches!(result, Err(TransportError::ShutdownTimeout { timeout_ms: 20 })));
    assert_eq!(transport.close(), Ok(()));
    Ok(())
}

#[test]
fn test_worker_panic_is_reported() -> TestResult {
    let mock = MockUsbBackend::new().panicking_on_close();
    let mut transport = G13Transport::spawn(mock, &settings())?;
    assert_eq!(transport.close(), Err(TransportError::WorkerPanicked));
    Ok(())
}
