//! Absolute-deadline periodic ticks on the tokio clock.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::{SchedulerError, SchedulerResult, TickMetrics};

/// A periodic tick source on a [`tokio::time::Interval`].
///
/// Deadlines are absolute, so time spent in the consumer between ticks does
/// not push later ticks back. Missed deadlines are skipped rather than fired
/// as a burst. [`Periodic::tick`] is cancel safe and can be a
/// `tokio::select!` branch.
#[derive(Debug)]
pub struct Periodic {
    interval: Interval,
    period: Duration,
    tick_count: u64,
    metrics: TickMetrics,
}

impl Periodic {
    /// First tick fires one period from now.
    pub fn new(period: Duration) -> SchedulerResult<Self> {
        Self::with_initial_delay(period, period)
    }

    /// First tick fires after `initial_delay`, then every `period`.
    pub fn with_initial_delay(period: Duration, initial_delay: Duration) -> SchedulerResult<Self> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        let mut interval = interval_at(Instant::now() + initial_delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self {
            interval,
            period,
            tick_count: 0,
            metrics: TickMetrics::new(),
        })
    }

    /// Wait for the next deadline and return the 1-based tick number.
    pub async fn tick(&mut self) -> u64 {
        let scheduled = self.interval.tick().await;

        let lateness = Instant::now().saturating_duration_since(scheduled);
        self.metrics.record_tick(lateness);
        self.tick_count += 1;

        let overrun = u64::try_from(lateness.as_nanos() / self.period.as_nanos()).unwrap_or(u64::MAX);
        if overrun > 0 {
            self.metrics.record_skipped(overrun);
            debug!(period = ?self.period, skipped = overrun, "Periodic fell behind, skipping");
        }

        self.tick_count
    }

    /// Restart the schedule one period from now.
    pub fn reset(&mut self) {
        self.interval.reset();
        self.tick_count = 0;
        self.metrics.reset();
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_rejected() {
        let result = Periodic::new(Duration::ZERO);
        assert!(matches!(result, Err(SchedulerError::ZeroPeriod)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_numbers_are_sequential() -> Result<(), SchedulerError> {
        let mut periodic = Periodic::new(Duration::from_millis(5))?;
        assert_eq!(periodic.tick().await, 1);
        assert_eq!(periodic.tick().await, 2);
        assert_eq!(periodic.tick().await, 3);
        assert_eq!(periodic.metrics().total_ticks, 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_count() -> Result<(), SchedulerError> {
        let mut periodic = Periodic::new(Duration::from_millis(5))?;
        periodic.tick().await;
        periodic.tick().await;
        periodic.reset();
        assert_eq!(periodic.tick_count(), 0);
        assert_eq!(periodic.tick().await, 1);
        Ok(())
    }
}
