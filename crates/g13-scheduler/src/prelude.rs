//! Prelude for periodic scheduling.

pub use crate::{
    LCD_INITIAL_DELAY, LCD_REFRESH, POLL_INTERVAL, Periodic, REPEAT_INTERVAL, SchedulerError,
    SchedulerResult, TickMetrics,
};
