//! LCD, LED, and backlight output state.
//!
//! [`DisplayOutput`] owns the compositor and the last state pushed to the
//! device. Writes go through an [`OutputSink`], which the transport
//! implements; nothing here blocks on USB.

use g13_errors::TransportError;
use g13_transport::G13Transport;
use hid_g13_protocol::ids::LED_COUNT;
use hid_g13_protocol::led_mask;
use tracing::{debug, trace, warn};

use crate::DisplayResult;
use crate::compositor::{Compositor, Scene};
use crate::framebuffer::{DitherMode, encode};

/// Where output commands are queued.
pub trait OutputSink {
    fn send_leds(&self, mask: u8) -> Result<(), TransportError>;
    fn send_backlight(&self, r: u8, g: u8, b: u8) -> Result<(), TransportError>;
    fn send_display(&self, payload: Vec<u8>) -> Result<(), TransportError>;
}

impl OutputSink for G13Transport {
    fn send_leds(&self, mask: u8) -> Result<(), TransportError> {
        self.enqueue_set_leds(mask)
    }

    fn send_backlight(&self, r: u8, g: u8, b: u8) -> Result<(), TransportError> {
        self.enqueue_set_backlight(r, g, b)
    }

    fn send_display(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.enqueue_set_display(payload)
    }
}

#[derive(Debug)]
pub struct DisplayOutput {
    compositor: Compositor,
    dither: DitherMode,
    last_sent: Option<Vec<u8>>,
    leds: [bool; LED_COUNT],
    backlight: Option<(u8, u8, u8)>,
    frames_sent: u64,
    frames_skipped: u64,
}

impl DisplayOutput {
    pub fn new(dither: DitherMode) -> Self {
        Self {
            compositor: Compositor::g13(),
            dither,
            last_sent: None,
            leds: [false; LED_COUNT],
            backlight: None,
            frames_sent: 0,
            frames_skipped: 0,
        }
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.compositor.set_scene(scene);
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Compose the scene and queue it for the LCD unless the device already
    /// shows the same picture. Returns whether a frame was queued.
    pub fn lcd_tick<S: OutputSink>(&mut self, sink: &S) -> DisplayResult<bool> {
        if self.last_sent.is_some() && !self.compositor.needs_render() {
            self.frames_skipped += 1;
            return Ok(false);
        }

        let payload = encode(self.compositor.compose(), self.dither)?;
        if self.last_sent.as_ref() == Some(&payload) {
            trace!("LCD content unchanged, skipping write");
            self.frames_skipped += 1;
            return Ok(false);
        }

        sink.send_display(payload.clone())?;
        self.last_sent = Some(payload);
        self.frames_sent += 1;
        trace!(frames_sent = self.frames_sent, "LCD frame queued");
        Ok(true)
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn led_states(&self) -> [bool; LED_COUNT] {
        self.leds
    }

    pub fn led_on<S: OutputSink>(&mut self, sink: &S, leds: &[usize]) -> DisplayResult<()> {
        self.update_leds(sink, leds, |_| true)
    }

    pub fn led_off<S: OutputSink>(&mut self, sink: &S, leds: &[usize]) -> DisplayResult<()> {
        self.update_leds(sink, leds, |_| false)
    }

    pub fn led_toggle<S: OutputSink>(&mut self, sink: &S, leds: &[usize]) -> DisplayResult<()> {
        self.update_leds(sink, leds, |state| !state)
    }

    fn update_leds<S: OutputSink>(
        &mut self,
        sink: &S,
        leds: &[usize],
        change: impl Fn(bool) -> bool,
    ) -> DisplayResult<()> {
        for &index in leds {
            match self.leds.get_mut(index) {
                Some(state) => *state = change(*state),
                None => warn!(index, max = LED_COUNT - 1, "Ignoring out-of-range LED index"),
            }
        }
        let mask = led_mask(&self.leds);
        debug!(mask = format_args!("{mask:#06b}"), "Setting LEDs");
        sink.send_leds(mask)?;
        Ok(())
    }

    pub fn backlight(&self) -> Option<(u8, u8, u8)> {
        self.backlight
    }

    pub fn set_backlight<S: OutputSink>(&mut self, sink: &S, r: u8, g: u8, b: u8) -> DisplayResult<()> {
        debug!(r, g, b, "Setting backlight");
        sink.send_backlight(r, g, b)?;
        self.backlight = Some((r, g, b));
        Ok(())
    }
}

impl Default for DisplayOutput {
    fn default() -> Self {
        Self::new(DitherMode::default())
    }
}
