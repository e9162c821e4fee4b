use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock abstraction for the refresh pipeline.
///
/// Every pipeline rule (lookback windows, gap thresholds, refresh rate
/// limiting) is defined against epoch-millisecond timestamps, so the clock
/// hands out milliseconds rather than opaque instants.
///
/// - now_ms(): current unix epoch milliseconds
/// - sleep(): sleeps for the provided duration (implementations may simulate)
pub trait Clock {
    fn now_ms(&self) -> i64;
    fn sleep(&self, d: Duration);
}

/// Default clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl WallClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for WallClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}
