//! Convenience re-exports for common test utilities.

pub use crate::fixtures::{
    CENTER, idle_report, joystick_report, report_with_keys, report_with_keys_at,
};
pub use crate::must::{must, must_err, must_some, must_with};
pub use crate::wait::{eventually, poll_until};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
