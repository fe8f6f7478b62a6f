//! Shared test utilities for the G13 driver.
//!
//! - [`mod@must`] - unwrap helpers with `#[track_caller]`
//! - [`fixtures`] - raw report builders
//! - [`wait`] - polling helpers for tests that cross the worker thread
//! - [`prelude`] - convenience re-exports

#![deny(unsafe_op_in_unsafe_fn)]

pub mod fixtures;
pub mod must;
pub mod prelude;
pub mod wait;

pub use must::*;
