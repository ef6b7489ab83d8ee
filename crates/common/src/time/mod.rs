//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock time (re-exported from testing)
//! - **[`format`]**: unix-second conversions and dashboard date formatting

pub mod format;

pub use format::{format_order_date, from_unix_seconds};

// Re-export Clock abstractions from testing module
pub use crate::testing::time::{Clock, MockClock, SystemClock};
