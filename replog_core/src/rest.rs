//! Rest interval countdown with overtime tracking.
//!
//! Counts down from a target to zero, then keeps counting *up* as overtime
//! until explicitly stopped. Like the elapsed stopwatch this is a wall-clock
//! state machine driven by caller `tick()`s: remaining time is derived from
//! the start instant, so coarse polling can never miss the zero crossing.
//!
//! ```text
//! idle -> running -> (countdown ticks) -> zero crossing -> overtime ticks -> idle
//! ```

use crate::clock::Clock;
use serde::Serialize;
use std::sync::Arc;

/// One reported rest-timer change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestTick {
    pub remaining_seconds: u32,
    pub overtime: bool,
    pub overtime_seconds: u32,
    /// Set on exactly one tick per countdown: the zero crossing
    pub just_completed: bool,
}

/// Read-only view of the timer for display
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct RestSnapshot {
    pub target_seconds: u32,
    pub remaining_seconds: u32,
    pub overtime: bool,
    pub overtime_seconds: u32,
    /// Exceeds 100 once the interval runs into overtime
    pub progress_pct: f64,
    pub running: bool,
}

/// Countdown/overtime rest timer. Pure timer logic; cannot fail.
pub struct RestTimer {
    clock: Arc<dyn Clock>,
    target_seconds: u32,
    /// Wall-clock start of the current run; `None` when idle
    started_at_ms: Option<u64>,
    /// Guards the one-shot completion notification
    completion_fired: bool,
    /// Last reported (remaining, overtime, overtime_seconds)
    last_reported: Option<(u32, bool, u32)>,
}

impl RestTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            target_seconds: 0,
            started_at_ms: None,
            completion_fired: false,
            last_reported: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn target_seconds(&self) -> u32 {
        self.target_seconds
    }

    /// Begin a fresh countdown, superseding any running one without a final
    /// idle tick. Emits the initial tick synchronously.
    pub fn start(&mut self, duration_seconds: u32) -> RestTick {
        self.target_seconds = duration_seconds;
        self.started_at_ms = Some(self.clock.now_ms());
        self.completion_fired = false;

        let initial = (duration_seconds, false, 0);
        self.last_reported = Some(initial);
        RestTick {
            remaining_seconds: duration_seconds,
            overtime: false,
            overtime_seconds: 0,
            just_completed: false,
        }
    }

    /// Halt ticking. With `notify`, emits one final `(0, false, 0)` tick so
    /// listeners can reset their display.
    pub fn stop(&mut self, notify: bool) -> Option<RestTick> {
        if self.started_at_ms.take().is_none() {
            return None;
        }
        self.completion_fired = false;
        self.last_reported = None;
        if notify {
            Some(RestTick {
                remaining_seconds: 0,
                overtime: false,
                overtime_seconds: 0,
                just_completed: false,
            })
        } else {
            None
        }
    }

    /// Stop without notifying and restore `remaining = target` for display.
    pub fn reset(&mut self) {
        self.stop(false);
    }

    /// Call on each scheduling opportunity while running.
    ///
    /// Reports only when the displayed value changed. The zero crossing sets
    /// `just_completed` on exactly one tick even if polling jumps straight
    /// from countdown into overtime.
    pub fn tick(&mut self) -> Option<RestTick> {
        let started = self.started_at_ms?;
        let elapsed_s = (self.clock.now_ms().saturating_sub(started) / 1000) as u32;

        let (remaining, overtime, overtime_seconds) = if elapsed_s < self.target_seconds {
            (self.target_seconds - elapsed_s, false, 0)
        } else {
            (0, true, elapsed_s - self.target_seconds)
        };

        let just_completed = overtime && !self.completion_fired;
        if just_completed {
            self.completion_fired = true;
        }

        let value = (remaining, overtime, overtime_seconds);
        if !just_completed && self.last_reported == Some(value) {
            return None;
        }
        self.last_reported = Some(value);

        Some(RestTick {
            remaining_seconds: remaining,
            overtime,
            overtime_seconds,
            just_completed,
        })
    }

    /// Read-only snapshot including percentage progress toward the target.
    pub fn state(&self) -> RestSnapshot {
        let (remaining, overtime, overtime_seconds, elapsed_s) = match self.started_at_ms {
            Some(started) => {
                let elapsed_s = (self.clock.now_ms().saturating_sub(started) / 1000) as u32;
                if elapsed_s < self.target_seconds {
                    (self.target_seconds - elapsed_s, false, 0, elapsed_s)
                } else {
                    (0, true, elapsed_s - self.target_seconds, elapsed_s)
                }
            }
            None => (self.target_seconds, false, 0, 0),
        };

        let progress_pct = if self.target_seconds == 0 {
            if self.started_at_ms.is_some() { 100.0 } else { 0.0 }
        } else {
            f64::from(elapsed_s) / f64::from(self.target_seconds) * 100.0
        };

        RestSnapshot {
            target_seconds: self.target_seconds,
            remaining_seconds: remaining,
            overtime,
            overtime_seconds,
            progress_pct,
            running: self.started_at_ms.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn timer() -> (Arc<ManualClock>, RestTimer) {
        let clock = Arc::new(ManualClock::new());
        let t = RestTimer::new(clock.clone());
        (clock, t)
    }

    #[test]
    fn test_initial_tick_is_synchronous() {
        let (_clock, mut t) = timer();
        let tick = t.start(90);
        assert_eq!(tick.remaining_seconds, 90);
        assert!(!tick.overtime);
        assert!(!tick.just_completed);
        assert!(t.is_running());
    }

    #[test]
    fn test_countdown_one_tick_per_second() {
        let (clock, mut t) = timer();
        t.start(5);

        clock.advance_secs(1);
        let tick = t.tick().unwrap();
        assert_eq!(tick.remaining_seconds, 4);

        // Same second: no duplicate
        assert_eq!(t.tick(), None);

        clock.advance_secs(1);
        assert_eq!(t.tick().unwrap().remaining_seconds, 3);
    }

    #[test]
    fn test_zero_crossing_fires_exactly_once() {
        let (clock, mut t) = timer();
        t.start(5);

        let mut completions = 0;
        for _ in 0..10 {
            clock.advance_secs(1);
            if let Some(tick) = t.tick() {
                if tick.just_completed {
                    completions += 1;
                    assert_eq!(tick.remaining_seconds, 0);
                    assert!(tick.overtime);
                    assert_eq!(tick.overtime_seconds, 0);
                }
            }
        }
        assert_eq!(completions, 1);
        let last = t.state();
        assert_eq!(last.overtime_seconds, 5);
    }

    #[test]
    fn test_completion_not_lost_when_polling_skips_crossing() {
        let (clock, mut t) = timer();
        t.start(5);

        // One coarse poll lands well past the boundary
        clock.advance_secs(8);
        let tick = t.tick().unwrap();
        assert!(tick.just_completed);
        assert!(tick.overtime);
        assert_eq!(tick.overtime_seconds, 3);

        clock.advance_secs(1);
        let tick = t.tick().unwrap();
        assert!(!tick.just_completed);
        assert_eq!(tick.overtime_seconds, 4);
    }

    #[test]
    fn test_overtime_counts_up_unbounded() {
        let (clock, mut t) = timer();
        t.start(2);

        clock.advance_secs(2);
        assert!(t.tick().unwrap().just_completed);

        clock.advance_secs(400);
        let tick = t.tick().unwrap();
        assert!(tick.overtime);
        assert_eq!(tick.overtime_seconds, 400);
    }

    #[test]
    fn test_stop_with_notify_emits_reset_tick() {
        let (clock, mut t) = timer();
        t.start(30);
        clock.advance_secs(3);
        t.tick();

        let final_tick = t.stop(true).unwrap();
        assert_eq!(
            final_tick,
            RestTick {
                remaining_seconds: 0,
                overtime: false,
                overtime_seconds: 0,
                just_completed: false,
            }
        );
        assert!(!t.is_running());
        assert_eq!(t.tick(), None);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (_clock, mut t) = timer();
        assert_eq!(t.stop(true), None);
    }

    #[test]
    fn test_restart_supersedes_without_idle_tick() {
        let (clock, mut t) = timer();
        t.start(10);
        clock.advance_secs(4);
        t.tick();

        // Second start cancels the first run outright
        let tick = t.start(20);
        assert_eq!(tick.remaining_seconds, 20);

        clock.advance_secs(1);
        assert_eq!(t.tick().unwrap().remaining_seconds, 19);

        // The old run's completion never fires
        clock.advance_secs(30);
        let tick = t.tick().unwrap();
        assert!(tick.just_completed);
        assert_eq!(tick.overtime_seconds, 11);
    }

    #[test]
    fn test_reset_restores_target_without_restarting() {
        let (clock, mut t) = timer();
        t.start(60);
        clock.advance_secs(10);
        t.tick();

        t.reset();
        assert!(!t.is_running());
        let state = t.state();
        assert_eq!(state.remaining_seconds, 60);
        assert!(!state.overtime);
        assert_eq!(state.progress_pct, 0.0);
    }

    #[test]
    fn test_progress_exceeds_hundred_in_overtime() {
        let (clock, mut t) = timer();
        t.start(10);

        clock.advance_secs(5);
        assert_eq!(t.state().progress_pct, 50.0);

        clock.advance_secs(10); // 15s elapsed on a 10s target
        assert_eq!(t.state().progress_pct, 150.0);
        assert!(t.state().overtime);
    }
}
