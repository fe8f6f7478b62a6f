//! Periodic tick sources for the cooperative side of the G13 driver.
//!
//! The cooperative context never blocks on USB I/O. It suspends between
//! ticks instead, and each periodic task (USB poll, LCD refresh, joystick
//! repeat) owns a [`Periodic`] that schedules against absolute deadlines so
//! slow callbacks do not accumulate drift.
//!
//! # Example
//!
//! ```no_run
//! use g13_scheduler::{LCD_REFRESH, Periodic};
//!
//! # async fn run() -> Result<(), g13_scheduler::SchedulerError> {
//! let mut lcd = Periodic::new(LCD_REFRESH)?;
//! loop {
//!     let tick = lcd.tick().await;
//!     // compose and send a frame
//!     # if tick > 3 { break; }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod metrics;
pub mod periodic;
pub mod prelude;

pub use metrics::TickMetrics;
pub use periodic::Periodic;

use std::time::Duration;

/// USB poll cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// LCD refresh cadence (~30 Hz).
pub const LCD_REFRESH: Duration = Duration::from_millis(33);

/// Delay before the first LCD refresh.
pub const LCD_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Joystick repeat clock.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Period must be non-zero")]
    ZeroPeriod,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
