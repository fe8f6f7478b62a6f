//! Timing behaviour of `Periodic` on a paused tokio clock.

use std::time::Duration;

use g13_scheduler::prelude::*;
use tokio::time::{Instant, sleep};

#[track_caller]
fn assert_near(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(2);
    assert!(
        actual >= expected && actual < expected + slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_after_one_period() -> Result<(), SchedulerError> {
    let start = Instant::now();
    let mut periodic = Periodic::new(LCD_REFRESH)?;
    periodic.tick().await;
    assert_near(start.elapsed(), LCD_REFRESH);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_initial_delay_then_period() -> Result<(), SchedulerError> {
    let start = Instant::now();
    let mut periodic = Periodic::with_initial_delay(LCD_REFRESH, LCD_INITIAL_DELAY)?;

    periodic.tick().await;
    assert_near(start.elapsed(), LCD_INITIAL_DELAY);

    periodic.tick().await;
    assert_near(start.elapsed(), LCD_INITIAL_DELAY + LCD_REFRESH);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_consumer_work_does_not_cause_drift() -> Result<(), SchedulerError> {
    let start = Instant::now();
    let mut periodic = Periodic::new(LCD_REFRESH)?;

    for _ in 0..10 {
        periodic.tick().await;
        sleep(Duration::from_millis(10)).await;
    }

    assert_near(start.elapsed(), LCD_REFRESH * 10 + Duration::from_millis(10));
    assert_eq!(periodic.metrics().skipped_ticks, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_falling_behind_skips_instead_of_bursting() -> Result<(), SchedulerError> {
    let start = Instant::now();
    let mut periodic = Periodic::new(LCD_REFRESH)?;

    periodic.tick().await;
    sleep(Duration::from_millis(100)).await;

    // The overdue deadline fires immediately.
    periodic.tick().await;
    assert_near(start.elapsed(), Duration::from_millis(133));
    assert_eq!(periodic.metrics().skipped_ticks, 2);

    // Missed deadlines are dropped; the next tick stays on the original grid.
    periodic.tick().await;
    assert_near(start.elapsed(), Duration::from_millis(165));
    assert_eq!(periodic.tick_count(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_tick_is_cancel_safe() -> Result<(), SchedulerError> {
    let mut periodic = Periodic::new(Duration::from_millis(20))?;

    tokio::select! {
        _ = periodic.tick() => panic!("tick should not win against a shorter sleep"),
        _ = sleep(Duration::from_millis(5)) => {}
    }
    assert_eq!(periodic.tick_count(), 0);

    assert_eq!(periodic.tick().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_cadence() -> Result<(), SchedulerError> {
    let start = Instant::now();
    let mut periodic = Periodic::new(POLL_INTERVAL)?;
    for _ in 0..50 {
        periodic.tick().await;
    }
    assert_near(start.elapsed(), Duration::from_millis(50));
    Ok(())
}
