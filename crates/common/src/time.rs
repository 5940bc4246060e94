//! Epoch-millisecond clock helpers.
//!
//! Every timestamp in the system is an `i64` of milliseconds since the Unix
//! epoch. Anything whose behavior depends on the clock takes the instant as
//! a parameter so tests can pin it.

use chrono::Utc;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
