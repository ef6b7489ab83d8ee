//! Timestamp conversions used by persisted meta values and payloads

use chrono::{DateTime, Utc};

/// Dashboard order date format.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert unix seconds into a UTC timestamp. `None` when out of range.
///
/// # Examples
///
/// ```
/// use recreviews_common::time::from_unix_seconds;
///
/// let at = from_unix_seconds(0).unwrap();
/// assert_eq!(at.to_rfc3339(), "1970-01-01T00:00:00+00:00");
/// ```
pub fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Render an order creation time as `YYYY-MM-DD HH:MM:SS`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use recreviews_common::time::format_order_date;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(format_order_date(at), "2024-03-09 07:05:01");
/// ```
pub fn format_order_date(at: DateTime<Utc>) -> String {
    at.format(ORDER_DATE_FORMAT).to_string()
}
