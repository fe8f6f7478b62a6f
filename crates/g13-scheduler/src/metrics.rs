//! Tick lateness bookkeeping.

use std::time::Duration;

/// Counters describing how well a [`crate::Periodic`] kept its schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickMetrics {
    /// Ticks delivered
    pub total_ticks: u64,

    /// Whole periods that had already passed beyond a deadline when its tick
    /// was delivered; those deadlines are skipped
    pub skipped_ticks: u64,

    /// Worst observed wake-up lateness
    pub max_lateness: Duration,

    /// Lateness of the most recent tick
    pub last_lateness: Duration,
}

impl TickMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&mut self, lateness: Duration) {
        self.total_ticks += 1;
        self.last_lateness = lateness;
        if lateness > self.max_lateness {
            self.max_lateness = lateness;
        }
    }

    pub fn record_skipped(&mut self, count: u64) {
        self.skipped_ticks += count;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tick_tracks_max() {
        let mut metrics = TickMetrics::new();
        metrics.record_tick(Duration::from_millis(3));
        metrics.record_tick(Duration::from_millis(1));
        assert_eq!(metrics.total_ticks, 2);
        assert_eq!(metrics.max_lateness, Duration::from_millis(3));
        assert_eq!(metrics.last_lateness, Duration::from_millis(1));
    }

    #[test]
    fn test_reset() {
        let mut metrics = TickMetrics::new();
        metrics.record_tick(Duration::from_millis(3));
        metrics.record_skipped(2);
        metrics.reset();
        assert_eq!(metrics, TickMetrics::default());
    }
}
