//! Core loop behaviour against the mock USB backend.

use std::time::Duration;

use g13_daemon::{CoreCommand, CoreEvent, DaemonConfig, G13Service, ServiceHandle, StopReason};
use g13_display::SolidLayer;
use g13_errors::TransportError;
use g13_input::{InputEvent, KeyAction};
use g13_test_helpers::prelude::*;
use g13_transport::mock::MockUsbBackend;
use g13_transport::{G13Transport, UsbError};
use hid_g13_protocol::ids::control::{BACKLIGHT_VALUE, LEDS_VALUE};
use hid_g13_protocol::RawReport;
use tokio::task::JoinHandle;

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

fn test_config() -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.device.settle_delay_ms = 0;
    config.display.initial_delay_ms = 1;
    config
}

fn queue(mock: &MockUsbBackend, report: RawReport) {
    mock.queue_report(report.as_bytes().to_vec());
}

fn start(
    config: &DaemonConfig,
    mock: &MockUsbBackend,
) -> Result<(JoinHandle<anyhow::Result<StopReason>>, ServiceHandle), Box<dyn std::error::Error>> {
    let transport = G13Transport::spawn(mock.clone(), &config.device.transport_settings())?;
    let (service, handle) = G13Service::new(config, transport)?;
    Ok((tokio::spawn(service.run()), handle))
}

async fn next_event(handle: &mut ServiceHandle) -> Option<CoreEvent> {
    tokio::time::timeout(EVENT_TIMEOUT, handle.events.recv())
        .await
        .ok()
        .flatten()
}

/// Collect events up to and including `Stopped`.
async fn events_until_stopped(handle: &mut ServiceHandle) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Some(event) = next_event(handle).await {
        let stopped = matches!(event, CoreEvent::Stopped(_));
        events.push(event);
        if stopped {
            break;
        }
    }
    events
}

fn pressed(key: &str) -> CoreEvent {
    CoreEvent::Input(InputEvent::KeyPressed(key.to_string()))
}

fn released(key: &str) -> CoreEvent {
    CoreEvent::Input(InputEvent::KeyReleased(key.to_string()))
}

#[tokio::test]
async fn end_program_key_stops_and_closes_once() -> TestResult {
    let mock = MockUsbBackend::new();
    queue(&mock, report_with_keys(&["BD"]));

    let (task, mut handle) = start(&test_config(), &mock)?;
    let events = events_until_stopped(&mut handle).await;
    let reason = task.await??;

    assert_eq!(reason, StopReason::EndProgram);
    assert_eq!(
        events,
        vec![pressed("BD"), CoreEvent::Stopped(StopReason::EndProgram)]
    );
    assert_eq!(mock.reset_count(), 1);
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[tokio::test]
async fn chords_fire_on_press_only() -> TestResult {
    let mock = MockUsbBackend::new();
    queue(&mock, report_with_keys(&["G1"]));
    queue(&mock, idle_report());
    queue(&mock, report_with_keys(&["BD"]));

    let mut config = test_config();
    config.mapping.insert(
        "G1",
        KeyAction::StaticChord(vec!["ctrl".to_string(), "c".to_string()]),
    );

    let (task, mut handle) = start(&config, &mock)?;
    let events = events_until_stopped(&mut handle).await;
    task.await??;

    assert_eq!(
        events,
        vec![
            pressed("G1"),
            CoreEvent::Chord(vec!["ctrl".to_string(), "c".to_string()]),
            released("G1"),
            pressed("BD"),
            CoreEvent::Stopped(StopReason::EndProgram),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn shutdown_command_stops_the_loop() -> TestResult {
    let mock = MockUsbBackend::new();
    let (task, mut handle) = start(&test_config(), &mock)?;

    handle.commands.send(CoreCommand::Shutdown)?;
    let events = events_until_stopped(&mut handle).await;
    assert_eq!(events, vec![CoreEvent::Stopped(StopReason::Requested)]);
    assert_eq!(task.await??, StopReason::Requested);
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn output_commands_reach_the_device() -> TestResult {
    let mock = MockUsbBackend::new();
    let (task, handle) = start(&test_config(), &mock)?;

    handle.commands.send(CoreCommand::LedOn(vec![0, 1]))?;
    handle.commands.send(CoreCommand::LedToggle(vec![1, 3]))?;
    handle
        .commands
        .send(CoreCommand::SetBacklight { r: 10, g: 20, b: 30 })?;
    handle.commands.send(CoreCommand::SetScene(vec![Box::new(
        SolidLayer::new(0, 0, 160, 8, true),
    )]))?;

    let top_band_lit = |frame: &Vec<u8>| frame.iter().skip(32).take(160).all(|b| *b == 0xFF);
    assert!(eventually(EVENT_TIMEOUT, || {
        mock.display_writes().last().is_some_and(top_band_lit)
    }));
    handle.commands.send(CoreCommand::Shutdown)?;
    task.await??;

    let controls = mock.control_writes();
    assert_eq!(
        controls,
        vec![
            (LEDS_VALUE, vec![0x05, 0b0011, 0, 0, 0]),
            (LEDS_VALUE, vec![0x05, 0b1001, 0, 0, 0]),
            (BACKLIGHT_VALUE, vec![0x07, 10, 20, 30, 0]),
        ]
    );

    let displays = mock.display_writes();
    let Some(last) = displays.last() else {
        return Err("no display write".into());
    };
    assert_eq!(last.len(), 32 + 960);
    assert_eq!(last.first(), Some(&0x03));
    assert!(top_band_lit(last));
    assert!(last.iter().skip(32 + 160).all(|b| *b == 0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unchanged_display_is_written_once() -> TestResult {
    let mock = MockUsbBackend::new();
    let (task, handle) = start(&test_config(), &mock)?;

    assert!(eventually(EVENT_TIMEOUT, || !mock.display_writes().is_empty()));
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.commands.send(CoreCommand::Shutdown)?;
    task.await??;

    assert_eq!(mock.display_writes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn exhausted_error_budget_stops_the_loop() -> TestResult {
    let mock = MockUsbBackend::new();
    for _ in 0..6 {
        mock.queue_error(UsbError::Io);
    }

    let (task, mut handle) = start(&test_config(), &mock)?;
    let events = events_until_stopped(&mut handle).await;
    let reason = task.await??;

    assert_eq!(reason, StopReason::BudgetExhausted { consecutive: 6 });
    let faults = events
        .iter()
        .filter(|e| matches!(e, CoreEvent::TransportFault(TransportError::RecoverableIo(_))))
        .count();
    assert_eq!(faults, 6);
    // One reset per error plus the shutdown reset.
    assert_eq!(mock.reset_count(), 7);
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[tokio::test]
async fn successful_report_resets_the_budget() -> TestResult {
    let mock = MockUsbBackend::new();
    for _ in 0..5 {
        mock.queue_error(UsbError::Pipe);
    }
    queue(&mock, report_with_keys(&["G2"]));
    for _ in 0..5 {
        mock.queue_error(UsbError::Pipe);
    }

    let (task, mut handle) = start(&test_config(), &mock)?;

    let mut faults = 0;
    let mut saw_key = false;
    while faults < 10 {
        match next_event(&mut handle).await {
            Some(CoreEvent::TransportFault(_)) => faults += 1,
            Some(event) if event == pressed("G2") => saw_key = true,
            Some(CoreEvent::Stopped(reason)) => return Err(format!("stopped early: {reason}").into()),
            Some(_) => {}
            None => return Err("timed out waiting for faults".into()),
        }
    }
    assert!(saw_key);

    handle.commands.send(CoreCommand::Shutdown)?;
    assert_eq!(task.await??, StopReason::Requested);
    Ok(())
}

#[tokio::test]
async fn fatal_usb_error_stops_the_loop() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_error(UsbError::Other("device on fire".to_string()));

    let (task, mut handle) = start(&test_config(), &mock)?;
    let events = events_until_stopped(&mut handle).await;
    let reason = task.await??;

    assert!(matches!(
        reason,
        StopReason::TransportFailed(TransportError::Fatal(_))
    ));
    assert!(matches!(
        events.first(),
        Some(CoreEvent::TransportFault(TransportError::Fatal(_)))
    ));
    assert_eq!(mock.close_count(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_reports_are_skipped() -> TestResult {
    let mock = MockUsbBackend::new();
    mock.queue_report(vec![0x01, 0x02, 0x03]);
    queue(&mock, report_with_keys(&["BD"]));

    let (task, mut handle) = start(&test_config(), &mock)?;
    let events = events_until_stopped(&mut handle).await;
    task.await??;

    assert_eq!(
        events,
        vec![
            CoreEvent::TransportFault(TransportError::MalformedReport {
                expected: 8,
                actual: 3
            }),
            pressed("BD"),
            CoreEvent::Stopped(StopReason::EndProgram),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn joystick_repeat_events_are_published() -> TestResult {
    let mock = MockUsbBackend::new();
    queue(&mock, joystick_report(0xFF, CENTER));

    let mut config = test_config();
    config.input.repeat_interval_ms = 5;
    let (task, mut handle) = start(&config, &mock)?;

    let mut saw_zone = false;
    let mut saw_repeat = false;
    while !saw_repeat {
        match next_event(&mut handle).await {
            Some(CoreEvent::Input(InputEvent::Joystick { .. })) => saw_zone = true,
            Some(CoreEvent::Input(InputEvent::Repeat { .. })) => saw_repeat = true,
            Some(_) => {}
            None => return Err("no repeat event".into()),
        }
    }
    assert!(saw_zone);

    handle.commands.send(CoreCommand::Shutdown)?;
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn errors_right_after_open_are_not_read_while_settling() -> TestResult {
    let mock = MockUsbBackend::new();
    for _ in 0..6 {
        mock.queue_error(UsbError::Io);
    }
    let mut config = test_config();
    config.device.settle_delay_ms = 400;

    let (task, mut handle) = start(&config, &mock)?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(mock.pending_reads(), 6);
    assert_eq!(mock.reset_count(), 0);

    handle.commands.send(CoreCommand::Shutdown)?;
    let events = events_until_stopped(&mut handle).await;
    assert_eq!(events, vec![CoreEvent::Stopped(StopReason::Requested)]);
    assert_eq!(task.await??, StopReason::Requested);
    assert_eq!(mock.pending_reads(), 6);
    assert_eq!(mock.close_count(), 1);
    Ok(())
}
