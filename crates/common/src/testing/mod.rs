//! Testing utilities shared across Rec.Reviews crates

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
