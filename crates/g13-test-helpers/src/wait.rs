//! Polling helpers for assertions that depend on another thread.

use std::thread;
use std::time::{Duration, Instant};

const POLL_STEP: Duration = Duration::from_millis(1);

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition was observed.
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_STEP);
    }
}

/// Poll `producer` until it yields a value or `timeout` elapses.
pub fn poll_until<T>(timeout: Duration, mut producer: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = producer() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_STEP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventually_true_immediately() {
        assert!(eventually(Duration::from_millis(10), || true));
    }

    #[test]
    fn test_eventually_times_out() {
        assert!(!eventually(Duration::from_millis(5), || false));
    }

    #[test]
    fn test_poll_until_counts() {
        let mut calls = 0;
        let value = poll_until(Duration::from_secs(1), || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(value, Some(3));
    }
}
