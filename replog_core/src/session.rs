//! Single-writer session container.
//!
//! `SessionTracker` owns the live [`Session`] and everything that acts on
//! it: both clocks, the save coordinator and the recovery gate. Clocks and
//! coordinator never touch session fields on their own; every mutation goes
//! through the tracker's entry points, and mutating entry points persist the
//! snapshot so an abandoned process leaves a recoverable trail.

use crate::clock::Clock;
use crate::config::Config;
use crate::elapsed::ElapsedClock;
use crate::recovery::RecoveryGate;
use crate::rest::{RestSnapshot, RestTick, RestTimer};
use crate::save::SaveCoordinator;
use crate::store::WorkoutStore;
use crate::types::{Session, Set, WorkoutStatus};
use crate::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// What changed on one scheduling opportunity
#[derive(Clone, Copy, Debug, Default)]
pub struct TickOutcome {
    /// New whole-second elapsed value, when it changed
    pub elapsed_seconds: Option<u64>,
    /// Rest timer change, when one occurred
    pub rest: Option<RestTick>,
}

/// Owns the in-progress session and its collaborators
pub struct SessionTracker<S: WorkoutStore> {
    session: Session,
    elapsed: ElapsedClock,
    rest: RestTimer,
    coordinator: SaveCoordinator<S>,
    gate: RecoveryGate,
    /// Snapshot found at load, held until the caller decides what to do
    persisted: Option<Session>,
    default_rest_seconds: u32,
}

impl<S: WorkoutStore> SessionTracker<S> {
    /// Build a tracker over a store and snapshot path.
    ///
    /// Reads any persisted snapshot immediately but never adopts it; a
    /// recoverable candidate stays behind [`Self::recoverable`] until the
    /// caller decides.
    pub fn new(
        store: S,
        config: &Config,
        snapshot_path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let gate = RecoveryGate::new(snapshot_path);
        let persisted = gate.load()?;

        Ok(Self {
            session: Session::new(""),
            elapsed: ElapsedClock::new(clock.clone()),
            rest: RestTimer::new(clock),
            coordinator: SaveCoordinator::new(store, config),
            gate,
            persisted,
            default_rest_seconds: config.rest.default_rest_seconds,
        })
    }

    // ── Observations ─────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rest_state(&self) -> RestSnapshot {
        self.rest.state()
    }

    /// The abandoned session awaiting a resume-or-discard decision, if any
    pub fn recoverable(&self) -> Option<&Session> {
        self.persisted
            .as_ref()
            .filter(|s| RecoveryGate::is_recoverable(s))
    }

    pub fn retry_count(&self) -> u32 {
        self.coordinator.retry_count()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Start a fresh workout session and its elapsed clock.
    pub fn start_session(&mut self, name: &str) -> Result<()> {
        if self.recoverable().is_some() {
            return Err(Error::State(
                "a recoverable session exists; resume or discard it first".into(),
            ));
        }
        match self.session.status {
            WorkoutStatus::Idle | WorkoutStatus::Saved => {}
            other => {
                return Err(Error::State(format!(
                    "cannot start a session while the current one is {:?}",
                    other
                )))
            }
        }

        let mut session = Session::new(name);
        session.status = WorkoutStatus::Active;
        self.session = session;
        self.persisted = None;
        self.elapsed.reset(0);
        self.elapsed.start();
        self.persist()?;
        tracing::info!("Started session '{}'", name);
        Ok(())
    }

    /// Continue a still-active persisted session as this writer's own.
    ///
    /// This is the same-writer continuation path (one process per command);
    /// unlike [`Self::resume_recovered`] it does not raise the recovery
    /// flag. Returns whether a session was adopted.
    pub fn continue_open(&mut self) -> Result<bool> {
        let active = matches!(
            self.persisted.as_ref().map(|s| s.status),
            Some(WorkoutStatus::Active)
        );
        if !active {
            return Ok(false);
        }

        let session = self.persisted.take().expect("checked above");
        self.elapsed.reset(session.elapsed_seconds);
        self.elapsed.start();
        self.session = session;
        tracing::debug!("Continuing open session '{}'", self.session.name);
        Ok(true)
    }

    /// Pause the elapsed clock at the precise wall-clock duration.
    pub fn pause(&mut self) -> Result<()> {
        self.require_active()?;
        self.elapsed.pause();
        self.session.elapsed_seconds = self.elapsed.elapsed_seconds();
        self.persist()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.require_active()?;
        self.elapsed.resume();
        Ok(())
    }

    /// Reset the session clock to an explicit value.
    pub fn set_elapsed(&mut self, seconds: u64) -> Result<()> {
        self.require_active()?;
        let was_running = self.elapsed.is_running();
        self.session.elapsed_seconds = self.elapsed.reset(seconds);
        if was_running {
            self.elapsed.start();
        }
        self.persist()
    }

    /// Drop the current session and its persisted snapshot entirely.
    pub fn reset_session(&mut self) -> Result<()> {
        self.elapsed.reset(0);
        self.rest.stop(false);
        self.session = Session::new("");
        self.persisted = None;
        self.gate.discard()?;
        Ok(())
    }

    /// Drive both clocks one scheduling opportunity.
    ///
    /// The elapsed tick is folded into the session; snapshots are persisted
    /// on user mutations, not per tick.
    pub fn tick(&mut self) -> TickOutcome {
        let elapsed_seconds = self.elapsed.tick();
        if let Some(seconds) = elapsed_seconds {
            self.session.elapsed_seconds = seconds;
        }
        TickOutcome {
            elapsed_seconds,
            rest: self.rest.tick(),
        }
    }

    /// Stop both clocks; call on teardown so nothing keeps ticking against
    /// a discarded session.
    pub fn dispose(&mut self) {
        self.elapsed.pause();
        self.rest.stop(false);
    }

    // ── Set mutations ────────────────────────────────────────────────

    pub fn add_set(&mut self, exercise: &str, set: Set) -> Result<()> {
        self.require_active()?;
        if exercise.trim().is_empty() {
            return Err(Error::State("exercise name must not be empty".into()));
        }
        self.session.exercise_mut(exercise).sets.push(set);
        self.persist()?;
        tracing::debug!("Added set to '{}'", exercise);
        Ok(())
    }

    /// Mark a set completed. Starts the rest countdown toward the set's
    /// target (or the configured default) and returns its initial tick.
    pub fn complete_set(&mut self, exercise: &str, index: usize) -> Result<RestTick> {
        self.require_active()?;
        let default_rest = self.default_rest_seconds;
        let entry = self
            .session
            .exercises
            .iter_mut()
            .find(|e| e.name == exercise)
            .ok_or_else(|| Error::State(format!("no exercise '{}' in session", exercise)))?;
        let set = entry
            .sets
            .get_mut(index)
            .ok_or_else(|| Error::State(format!("no set {} for '{}'", index, exercise)))?;

        set.completed = true;
        set.editing = false;
        let target = set.rest_target_seconds.unwrap_or(default_rest);
        self.persist()?;
        tracing::debug!("Completed set {} of '{}'", index, exercise);
        Ok(self.rest.start(target))
    }

    pub fn remove_set(&mut self, exercise: &str, index: usize) -> Result<()> {
        self.require_active()?;
        let pos = self
            .session
            .exercises
            .iter()
            .position(|e| e.name == exercise)
            .ok_or_else(|| Error::State(format!("no exercise '{}' in session", exercise)))?;
        let entry = &mut self.session.exercises[pos];
        if index >= entry.sets.len() {
            return Err(Error::State(format!("no set {} for '{}'", index, exercise)));
        }
        entry.sets.remove(index);
        if entry.sets.is_empty() {
            self.session.exercises.remove(pos);
        }
        self.persist()
    }

    // ── Rest interval ────────────────────────────────────────────────

    pub fn start_rest(&mut self, seconds: Option<u32>) -> Result<RestTick> {
        self.require_active()?;
        let target = seconds.unwrap_or(self.default_rest_seconds);
        Ok(self.rest.start(target))
    }

    pub fn stop_rest(&mut self, notify: bool) -> Option<RestTick> {
        self.rest.stop(notify)
    }

    pub fn reset_rest(&mut self) {
        self.rest.reset();
    }

    // ── Save and retry ───────────────────────────────────────────────

    /// Finish the session: freeze the clock and drain it through the save
    /// steps. Returns the final session state; on success the live session
    /// and its snapshot are cleared.
    pub fn finish(&mut self) -> Result<Session> {
        self.require_active()?;
        if self.session.is_empty() {
            return Err(Error::State(
                "session has no recorded sets; add a set or reset".into(),
            ));
        }
        self.elapsed.pause();
        self.session.elapsed_seconds = self.elapsed.elapsed_seconds();
        self.rest.stop(false);

        self.coordinator.save(&mut self.session);
        self.settle_after_save()
    }

    /// Re-attempt a failed save without re-running succeeded steps.
    ///
    /// Works on the live session, or adopts a persisted snapshot left in
    /// `Partial`/`Failed` by a previous process; the user asking for a
    /// retry is the explicit decision the recovery gate requires.
    pub fn retry(&mut self) -> Result<Session> {
        match self.session.status {
            WorkoutStatus::Partial | WorkoutStatus::Failed => {}
            _ => {
                let adoptable = matches!(
                    self.persisted.as_ref().map(|s| s.status),
                    Some(WorkoutStatus::Partial) | Some(WorkoutStatus::Failed)
                );
                if adoptable {
                    self.session = self.persisted.take().expect("checked above");
                    self.session.recovered = true;
                } else {
                    return Err(Error::State("no failed save to retry".into()));
                }
            }
        }

        self.coordinator.retry(&mut self.session);
        self.settle_after_save()
    }

    fn settle_after_save(&mut self) -> Result<Session> {
        let outcome = self.session.clone();
        if outcome.status == WorkoutStatus::Saved {
            self.gate.discard()?;
            self.session = Session::new("");
        } else {
            // Keep the failed attempt recoverable across a crash
            self.persist()?;
        }
        Ok(outcome)
    }

    // ── Recovery decisions ───────────────────────────────────────────

    /// Adopt the detected session: elapsed clock restored to the snapshot
    /// value and running again.
    pub fn resume_recovered(&mut self) -> Result<()> {
        if self.recoverable().is_none() {
            return Err(Error::State("no recoverable session to resume".into()));
        }
        let mut session = self.persisted.take().expect("checked above");

        session.status = WorkoutStatus::Recovering;
        tracing::info!("Rehydrating session '{}'", session.name);
        RecoveryGate::mark_resumed(&mut session);

        self.elapsed.reset(session.elapsed_seconds);
        self.elapsed.start();
        self.session = session;
        self.persist()
    }

    /// Reject the persisted session: snapshot cleared, live session reset
    /// to empty idle.
    pub fn discard_recovered(&mut self) -> Result<()> {
        if self.persisted.take().is_none() {
            return Err(Error::State("no recoverable session to discard".into()));
        }
        self.gate.discard()?;
        self.elapsed.reset(0);
        self.rest.stop(false);
        self.session = Session::new("");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require_active(&self) -> Result<()> {
        if self.session.status != WorkoutStatus::Active {
            return Err(Error::State(format!(
                "no active session (status {:?})",
                self.session.status
            )));
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.session.updated_at = Utc::now();
        self.session.save_snapshot(self.gate.path())
    }
}
