//! Wall-clock access for usage statistics.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds. Returns 0 if the system clock is
/// before the epoch, which only breaks usage statistics, never safety.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
