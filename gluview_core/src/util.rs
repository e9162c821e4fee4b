//! Common time helpers for gluview_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: i64 = 1_000;
/// Number of milliseconds in one minute.
pub const MILLIS_PER_MIN: i64 = 60_000;

/// Milliseconds for a whole number of minutes.
#[inline]
pub fn minutes_ms(minutes: i64) -> i64 {
    minutes.saturating_mul(MILLIS_PER_MIN)
}
