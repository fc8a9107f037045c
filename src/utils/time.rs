//! Wall-clock helpers

use chrono::Utc;

/// Current UTC time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
