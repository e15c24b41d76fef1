//! Wall-clock source for the session timers.
//!
//! Both clocks derive elapsed time by re-reading a clock and subtracting a
//! fixed start instant, never by counting callbacks. The source is a trait so
//! tests can drive time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic-enough millisecond clock
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// System wall clock (ms since the Unix epoch)
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests and simulation
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ms(&self, ms: u64) {
        self.ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: u64) {
        self.ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}
