//! The cooperative core loop.
//!
//! [`G13Service`] is the single consumer of the transport's inbound queue.
//! It runs three periodic tasks on one tokio task (inbound polling, LCD
//! refresh, and joystick repeat) and serves [`CoreCommand`]s from other
//! components. Everything it learns is published as [`CoreEvent`]s.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use g13_display::{DisplayOutput, Scene};
use g13_errors::TransportError;
use g13_input::{BehaviorRegistry, Dispatch, InputDecoder, InputEvent, KeyMapper};
use g13_scheduler::Periodic;
use g13_transport::{ErrorBudget, G13Transport};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::DaemonConfig;

/// Requests accepted from other components.
pub enum CoreCommand {
    LedOn(Vec<usize>),
    LedOff(Vec<usize>),
    LedToggle(Vec<usize>),
    SetBacklight { r: u8, g: u8, b: u8 },
    /// Replace the active scene wholesale
    SetScene(Scene),
    Shutdown,
}

impl fmt::Debug for CoreCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LedOn(leds) => f.debug_tuple("LedOn").field(leds).finish(),
            Self::LedOff(leds) => f.debug_tuple("LedOff").field(leds).finish(),
            Self::LedToggle(leds) => f.debug_tuple("LedToggle").field(leds).finish(),
            Self::SetBacklight { r, g, b } => f
                .debug_struct("SetBacklight")
                .field("r", r)
                .field("g", g)
                .field("b", b)
                .finish(),
            Self::SetScene(scene) => write!(f, "SetScene({} layers)", scene.len()),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Notifications published by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    Input(InputEvent),
    /// A mapped chord, ready for an external key injector
    Chord(Vec<String>),
    TransportFault(TransportError),
    Stopped(StopReason),
}

/// Why the core loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A `Shutdown` command or a signal
    Requested,
    /// The `end_program` behaviour fired
    EndProgram,
    /// Too many consecutive recoverable USB errors
    BudgetExhausted { consecutive: u32 },
    /// The transport reported an unrecoverable error
    TransportFailed(TransportError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("shutdown requested"),
            Self::EndProgram => f.write_str("end_program behavior"),
            Self::BudgetExhausted { consecutive } => {
                write!(f, "{consecutive} consecutive recoverable USB errors")
            }
            Self::TransportFailed(e) => write!(f, "transport failure: {e}"),
        }
    }
}

/// Loop periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTiming {
    pub poll_interval: Duration,
    pub lcd_refresh: Duration,
    pub lcd_initial_delay: Duration,
    pub repeat_interval: Duration,
}

impl ServiceTiming {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            poll_interval: config.supervisor.poll_interval(),
            lcd_refresh: config.display.refresh(),
            lcd_initial_delay: config.display.initial_delay(),
            repeat_interval: config.input.repeat_interval(),
        }
    }
}

/// The other components' side of the core's channels.
#[derive(Debug)]
pub struct ServiceHandle {
    pub commands: mpsc::UnboundedSender<CoreCommand>,
    pub events: mpsc::UnboundedReceiver<CoreEvent>,
}

pub struct G13Service {
    transport: G13Transport,
    decoder: InputDecoder,
    mapper: KeyMapper,
    output: DisplayOutput,
    budget: ErrorBudget,
    timing: ServiceTiming,
    startup_backlight: Option<[u8; 3]>,
    commands: mpsc::UnboundedReceiver<CoreCommand>,
    events: mpsc::UnboundedSender<CoreEvent>,
}

impl G13Service {
    /// Build the core around an open transport with the built-in behaviours.
    pub fn new(config: &DaemonConfig, transport: G13Transport) -> Result<(Self, ServiceHandle)> {
        Self::with_registry(config, transport, BehaviorRegistry::with_builtins())
    }

    pub fn with_registry(
        config: &DaemonConfig,
        transport: G13Transport,
        registry: BehaviorRegistry,
    ) -> Result<(Self, ServiceHandle)> {
        let decoder = InputDecoder::new(config.input.decoder_settings())
            .context("Invalid input settings")?;
        let mapper =
            KeyMapper::new(config.mapping.clone(), registry).context("Invalid key mapping")?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let service = Self {
            transport,
            decoder,
            mapper,
            output: DisplayOutput::new(config.display.dither),
            budget: ErrorBudget::new(config.supervisor.error_budget),
            timing: ServiceTiming::from_config(config),
            startup_backlight: config.display.backlight,
            commands: command_rx,
            events: event_tx,
        };
        let handle = ServiceHandle {
            commands: command_tx,
            events: event_rx,
        };
        Ok((service, handle))
    }

    /// Run until shutdown, then close the transport.
    pub async fn run(mut self) -> Result<StopReason> {
        let timing = self.timing;
        if let Some([r, g, b]) = self.startup_backlight
            && let Err(e) = self.output.set_backlight(&self.transport, r, g, b)
        {
            warn!(error = %e, "Failed to set startup backlight");
        }

        let mut poll = Periodic::new(timing.poll_interval)?;
        let mut lcd = Periodic::with_initial_delay(timing.lcd_refresh, timing.lcd_initial_delay)?;
        let mut repeat = Periodic::new(timing.repeat_interval)?;
        let mut commands_open = true;

        info!("G13 core running");
        let reason = loop {
            tokio::select! {
                _ = poll.tick() => {
                    if let Some(reason) = self.drain_inbound() {
                        break reason;
                    }
                }
                _ = lcd.tick() => self.refresh_lcd(),
                _ = repeat.tick() => self.repeat_tick(),
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if let Some(reason) = self.execute(command) {
                            break reason;
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
            }
        };

        info!(reason = %reason, "G13 core stopping");
        debug!(
            poll_skipped = poll.metrics().skipped_ticks,
            lcd_skipped = lcd.metrics().skipped_ticks,
            "Scheduler summary"
        );
        self.shutdown(reason).await
    }

    fn drain_inbound(&mut self) -> Option<StopReason> {
        loop {
            match self.transport.poll_read() {
                Ok(Some(report)) => {
                    self.budget.record_success();
                    trace!(report = %report, "Report");
                    let mut events = Vec::new();
                    self.decoder.decode(&report, &mut events);
                    for event in events {
                        if let Some(reason) = self.dispatch(event) {
                            return Some(reason);
                        }
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    self.emit(CoreEvent::TransportFault(e.clone()));
                    if let Some(reason) = self.supervise(e) {
                        return Some(reason);
                    }
                }
            }
        }
    }

    fn supervise(&mut self, error: TransportError) -> Option<StopReason> {
        if error.counts_toward_budget() {
            if self.budget.record_recoverable() {
                error!(
                    consecutive = self.budget.consecutive(),
                    limit = self.budget.limit(),
                    "USB error budget exhausted"
                );
                return Some(StopReason::BudgetExhausted {
                    consecutive: self.budget.consecutive(),
                });
            }
            warn!(
                consecutive = self.budget.consecutive(),
                limit = self.budget.limit(),
                error = %error,
                "Recoverable USB error"
            );
            return None;
        }

        if error.is_recoverable() {
            debug!(error = %error, "Ignoring benign transport error");
            return None;
        }

        error!(error = %error, "Transport failed");
        Some(StopReason::TransportFailed(error))
    }

    fn dispatch(&mut self, event: InputEvent) -> Option<StopReason> {
        let outcome = self.mapper.dispatch(&event);
        debug!(event = %event, "Input");
        self.emit(CoreEvent::Input(event));
        match outcome {
            Dispatch::Chord(keys) => {
                self.emit(CoreEvent::Chord(keys));
                None
            }
            Dispatch::Shutdown => Some(StopReason::EndProgram),
            Dispatch::Handled | Dispatch::Ignored => None,
        }
    }

    fn repeat_tick(&mut self) {
        let mut events = Vec::new();
        self.decoder.repeat_tick(&mut events);
        for event in events {
            trace!(event = %event, "Repeat");
            self.emit(CoreEvent::Input(event));
        }
    }

    fn refresh_lcd(&mut self) {
        if let Err(e) = self.output.lcd_tick(&self.transport) {
            warn!(error = %e, "LCD refresh failed");
        }
    }

    fn execute(&mut self, command: CoreCommand) -> Option<StopReason> {
        trace!(command = ?command, "Core command");
        let result = match command {
            CoreCommand::LedOn(leds) => self.output.led_on(&self.transport, &leds),
            CoreCommand::LedOff(leds) => self.output.led_off(&self.transport, &leds),
            CoreCommand::LedToggle(leds) => self.output.led_toggle(&self.transport, &leds),
            CoreCommand::SetBacklight { r, g, b } => {
                self.output.set_backlight(&self.transport, r, g, b)
            }
            CoreCommand::SetScene(scene) => {
                self.output.set_scene(scene);
                Ok(())
            }
            CoreCommand::Shutdown => return Some(StopReason::Requested),
        };
        if let Err(e) = result {
            warn!(error = %e, "Output command failed");
        }
        None
    }

    fn emit(&self, event: CoreEvent) {
        if self.events.send(event).is_err() {
            trace!("No event listener");
        }
    }

    async fn shutdown(self, reason: StopReason) -> Result<StopReason> {
        let Self {
            mut transport,
            events,
            ..
        } = self;

        let closed = tokio::task::spawn_blocking(move || transport.close())
            .await
            .context("Transport close task failed")?;

        if events.send(CoreEvent::Stopped(reason.clone())).is_err() {
            trace!("No event listener");
        }

        closed.context("Failed to close G13 transport")?;
        Ok(reason)
    }
}

impl fmt::Debug for G13Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("G13Service")
            .field("timing", &self.timing)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}
