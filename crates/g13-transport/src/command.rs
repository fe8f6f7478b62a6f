//! Outbound commands for the worker.

use crossbeam::channel::Sender;

/// A request for the worker, processed in FIFO order.
#[derive(Debug)]
pub enum Command {
    /// LED bitmask, LED i on bit i
    SetLeds(u8),
    SetBacklight { r: u8, g: u8, b: u8 },
    /// Packed LCD payload without the header
    SetDisplay(Vec<u8>),
    /// Reset and release the device, acknowledge, then exit
    Stop(Sender<()>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetLeds(_) => "set_leds",
            Command::SetBacklight { .. } => "set_backlight",
            Command::SetDisplay(_) => "set_display",
            Command::Stop(_) => "stop",
        }
    }
}
