//! Drift-corrected elapsed-time stopwatch for the active session.
//!
//! The stopwatch is a wall-clock state machine with no internal thread; the
//! owner calls `tick()` on each scheduling opportunity. Elapsed time is
//! always `accumulated + (now - started_at)`, so delayed or skipped ticks
//! never under-count, and a tick is reported only when the whole-second
//! value changes.

use crate::clock::Clock;
use std::sync::Arc;

/// Whole-second stopwatch. Cannot fail; mis-driven calls are no-ops.
pub struct ElapsedClock {
    clock: Arc<dyn Clock>,
    /// Milliseconds accumulated across completed running intervals
    accumulated_ms: u64,
    /// Wall-clock instant of the current running interval, if running
    started_at_ms: Option<u64>,
    /// Last whole-second value reported from `tick()` or `reset()`
    last_reported: Option<u64>,
}

impl ElapsedClock {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            accumulated_ms: 0,
            started_at_ms: None,
            last_reported: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Begin counting from the current accumulated value. No-op if running.
    pub fn start(&mut self) {
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(self.clock.now_ms());
        }
    }

    /// Freeze the accumulated value at the precise wall-clock duration since
    /// the last `start()`, not at the last reported tick.
    pub fn pause(&mut self) {
        if let Some(t0) = self.started_at_ms.take() {
            let now = self.clock.now_ms();
            self.accumulated_ms += now.saturating_sub(t0);
        }
    }

    pub fn resume(&mut self) {
        self.start();
    }

    /// Stop and set the accumulated value; reports the new value immediately.
    pub fn reset(&mut self, to_seconds: u64) -> u64 {
        self.started_at_ms = None;
        self.accumulated_ms = to_seconds * 1000;
        self.last_reported = Some(to_seconds);
        to_seconds
    }

    pub fn elapsed_ms(&self) -> u64 {
        let running = self
            .started_at_ms
            .map(|t0| self.clock.now_ms().saturating_sub(t0))
            .unwrap_or(0);
        self.accumulated_ms + running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_ms() / 1000
    }

    /// Call on each scheduling opportunity while running.
    ///
    /// Returns the whole-second count only when it changed since the last
    /// report (monotonic, no duplicate ticks).
    pub fn tick(&mut self) -> Option<u64> {
        if self.started_at_ms.is_none() {
            return None;
        }
        let seconds = self.elapsed_seconds();
        if self.last_reported == Some(seconds) {
            return None;
        }
        self.last_reported = Some(seconds);
        Some(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn stopwatch() -> (Arc<ManualClock>, ElapsedClock) {
        let clock = Arc::new(ManualClock::new());
        let sw = ElapsedClock::new(clock.clone());
        (clock, sw)
    }

    #[test]
    fn test_ticks_only_on_second_change() {
        let (clock, mut sw) = stopwatch();
        sw.start();

        assert_eq!(sw.tick(), Some(0));
        assert_eq!(sw.tick(), None); // same second, no duplicate

        clock.advance_ms(999);
        assert_eq!(sw.tick(), None);

        clock.advance_ms(1);
        assert_eq!(sw.tick(), Some(1));
    }

    #[test]
    fn test_skipped_callbacks_do_not_undercount() {
        let (clock, mut sw) = stopwatch();
        sw.start();
        sw.tick();

        // No ticks fire for 10 simulated seconds (background throttling)
        clock.advance_secs(10);
        assert_eq!(sw.tick(), Some(10));
    }

    #[test]
    fn test_pause_freezes_precise_duration() {
        let (clock, mut sw) = stopwatch();
        sw.start();

        // Pause mid-second; the partial second must be kept
        clock.advance_ms(2500);
        sw.pause();
        assert_eq!(sw.elapsed_ms(), 2500);

        clock.advance_secs(60); // time passes while paused
        assert_eq!(sw.elapsed_ms(), 2500);

        sw.resume();
        clock.advance_ms(500);
        assert_eq!(sw.elapsed_seconds(), 3);
        assert_eq!(sw.tick(), Some(3));
    }

    #[test]
    fn test_sum_of_running_intervals() {
        let (clock, mut sw) = stopwatch();

        sw.start();
        clock.advance_secs(5);
        sw.pause();

        clock.advance_secs(100);

        sw.resume();
        clock.advance_secs(7);
        sw.pause();

        assert_eq!(sw.elapsed_seconds(), 12);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let (clock, mut sw) = stopwatch();
        sw.start();
        clock.advance_secs(4);
        sw.start(); // must not restart the interval
        assert_eq!(sw.elapsed_seconds(), 4);
    }

    #[test]
    fn test_pause_when_stopped_is_noop() {
        let (_clock, mut sw) = stopwatch();
        sw.pause();
        assert_eq!(sw.elapsed_ms(), 0);
        assert!(!sw.is_running());
    }

    #[test]
    fn test_reset_reports_new_value_and_stops() {
        let (clock, mut sw) = stopwatch();
        sw.start();
        clock.advance_secs(30);
        sw.tick();

        assert_eq!(sw.reset(120), 120);
        assert!(!sw.is_running());
        assert_eq!(sw.elapsed_seconds(), 120);

        // Restarting does not re-report the reset value
        sw.start();
        assert_eq!(sw.tick(), None);
        clock.advance_secs(1);
        assert_eq!(sw.tick(), Some(121));
    }

    #[test]
    fn test_monotonic_never_decreasing() {
        let (clock, mut sw) = stopwatch();
        sw.start();

        let mut last = 0;
        for _ in 0..50 {
            clock.advance_ms(700);
            if let Some(s) = sw.tick() {
                assert!(s > last || (s == 0 && last == 0));
                last = s;
            }
        }
        assert_eq!(last, 35);
    }
}
