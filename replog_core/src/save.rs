//! Multi-step save coordinator.
//!
//! Persists a session through the fixed step sequence
//! `workout -> exercise-sets -> analytics`, tracking fine-grained progress
//! for the UI and supporting retry without re-running steps that already
//! succeeded. Failures never escape this boundary: they are classified,
//! appended to `save_progress.errors` and reflected in the session status,
//! so callers observe state rather than catching errors.

use crate::config::{Config, LimitsConfig, RecoveryConfig};
use crate::store::{StoreError, StoreErrorKind, WorkoutStore};
use crate::types::{SaveProgress, SaveStep, Session, WorkoutError, WorkoutErrorKind, WorkoutStatus};
use crate::validate::validate_session;
use chrono::Utc;
use uuid::Uuid;

/// Drives the ordered save sequence against a [`WorkoutStore`].
///
/// The coordinator borrows a session for the duration of an attempt and only
/// advances `status`/`save_progress`; step bookkeeping (which steps have
/// succeeded, the upserted workout id, the retry counter) lives here.
pub struct SaveCoordinator<S: WorkoutStore> {
    store: S,
    limits: LimitsConfig,
    policy: RecoveryConfig,
    /// Id returned by the first successful workout step; reused on retry so
    /// the header is upserted, never duplicated
    workout_id: Option<Uuid>,
    succeeded: [bool; SaveStep::ORDER.len()],
    retry_count: u32,
}

impl<S: WorkoutStore> SaveCoordinator<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            limits: config.limits.clone(),
            policy: config.recovery.clone(),
            workout_id: None,
            succeeded: [false; SaveStep::ORDER.len()],
            retry_count: 0,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Run a fresh save attempt over the session.
    ///
    /// Transitions the session to `Saving`, executes the steps in order and
    /// leaves the session `Saved` (progress cleared), `Partial` or `Failed`.
    pub fn save(&mut self, session: &mut Session) {
        self.workout_id = None;
        self.succeeded = [false; SaveStep::ORDER.len()];

        session.status = WorkoutStatus::Saving;
        session.save_progress = Some(SaveProgress::starting());
        tracing::info!("Saving workout '{}' ({})", session.name, session.id);

        self.attempt(session);
    }

    /// Re-attempt a failed save, starting from the first step that has not
    /// yet succeeded. Valid only from `Partial` or `Failed`; anything else
    /// is a logged no-op.
    pub fn retry(&mut self, session: &mut Session) {
        match session.status {
            WorkoutStatus::Partial | WorkoutStatus::Failed => {}
            other => {
                tracing::warn!("retry() called in status {:?}; ignoring", other);
                return;
            }
        }

        // A coordinator built after a restart has no step bookkeeping; the
        // persisted progress counter says how many ordered steps succeeded.
        if !self.succeeded.iter().any(|s| *s) {
            if let Some(progress) = &session.save_progress {
                for i in 0..progress.completed.min(self.succeeded.len()) {
                    self.succeeded[i] = true;
                }
                if progress.completed > 0 {
                    self.workout_id = Some(session.id);
                }
            }
        }

        self.retry_count += 1;
        let completed = self.succeeded.iter().filter(|s| **s).count();
        let first_pending = SaveStep::ORDER
            .iter()
            .copied()
            .find(|s| !self.succeeded[s.index()])
            .unwrap_or(SaveStep::Workout);

        session.status = WorkoutStatus::Saving;
        session.save_progress = Some(SaveProgress {
            step: first_pending,
            total: SaveStep::ORDER.len(),
            completed,
            errors: Vec::new(),
        });
        tracing::info!(
            "Retrying save of '{}' from step {:?} (attempt {})",
            session.name,
            first_pending,
            self.retry_count + 1
        );

        self.attempt(session);
    }

    fn attempt(&mut self, session: &mut Session) {
        // Validation gate before the first step; never reaches the store.
        if !self.succeeded[SaveStep::Workout.index()] {
            let issues = validate_session(session, &self.limits);
            if !issues.is_empty() {
                let error = WorkoutError {
                    kind: WorkoutErrorKind::Validation,
                    message: "workout failed validation".to_string(),
                    details: Some(issues.join("; ")),
                    at: Utc::now(),
                    recoverable: true,
                };
                tracing::warn!("Validation rejected save: {}", issues.join("; "));
                self.record_failure(session, error);
                return;
            }
        }

        for step in SaveStep::ORDER {
            if self.succeeded[step.index()] {
                continue;
            }

            if let Some(progress) = session.save_progress.as_mut() {
                progress.step = step;
            }

            match self.execute(step, session) {
                Ok(()) => {
                    self.succeeded[step.index()] = true;
                    if let Some(progress) = session.save_progress.as_mut() {
                        progress.completed += 1;
                    }
                    tracing::debug!("Save step {:?} succeeded", step);
                }
                Err(e) => {
                    tracing::warn!("Save step {:?} failed: {}", step, e);
                    let error = self.classify(e);
                    self.record_failure(session, error);
                    return;
                }
            }
        }

        session.status = WorkoutStatus::Saved;
        session.save_progress = None;
        tracing::info!("Workout '{}' saved", session.name);
    }

    fn execute(&mut self, step: SaveStep, session: &Session) -> Result<(), StoreError> {
        match step {
            SaveStep::Workout => {
                let id = self.store.create_or_update_workout(&session.header())?;
                self.workout_id = Some(id);
                Ok(())
            }
            SaveStep::ExerciseSets => {
                let id = self.require_workout_id()?;
                self.store.write_exercise_sets(id, &session.set_records())
            }
            SaveStep::Analytics => {
                let id = self.require_workout_id()?;
                self.store.update_analytics(id, &session.derived_metrics())
            }
        }
    }

    fn require_workout_id(&self) -> Result<Uuid, StoreError> {
        self.workout_id
            .ok_or_else(|| StoreError::unknown("no workout id before dependent step"))
    }

    fn record_failure(&self, session: &mut Session, error: WorkoutError) {
        let any_succeeded = self.succeeded.iter().any(|s| *s);
        session
            .save_progress
            .get_or_insert_with(SaveProgress::starting)
            .errors
            .push(error);
        session.status = if any_succeeded {
            WorkoutStatus::Partial
        } else {
            WorkoutStatus::Failed
        };
    }

    fn classify(&self, e: StoreError) -> WorkoutError {
        let (kind, recoverable) = match e.kind {
            StoreErrorKind::Network => (WorkoutErrorKind::Network, true),
            StoreErrorKind::Database => {
                (WorkoutErrorKind::Database, self.policy.database_recoverable)
            }
            StoreErrorKind::Unknown => (WorkoutErrorKind::Unknown, self.policy.unknown_recoverable),
        };
        WorkoutError {
            kind,
            message: e.message,
            details: None,
            at: Utc::now(),
            recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Set;

    #[derive(Default)]
    struct MockStore {
        order: Vec<&'static str>,
        workout_calls: u32,
        sets_calls: u32,
        analytics_calls: u32,
        fail_workout: Option<StoreErrorKind>,
        fail_sets: Option<StoreErrorKind>,
        fail_analytics: Option<StoreErrorKind>,
    }

    fn injected(kind: StoreErrorKind) -> StoreError {
        StoreError {
            kind,
            message: "injected failure".into(),
        }
    }

    impl WorkoutStore for MockStore {
        fn create_or_update_workout(
            &mut self,
            header: &crate::types::WorkoutHeader,
        ) -> Result<Uuid, StoreError> {
            self.order.push("workout");
            self.workout_calls += 1;
            match self.fail_workout {
                Some(kind) => Err(injected(kind)),
                None => Ok(header.id),
            }
        }

        fn write_exercise_sets(
            &mut self,
            _workout_id: Uuid,
            _sets: &[crate::types::SetRecord],
        ) -> Result<(), StoreError> {
            self.order.push("sets");
            self.sets_calls += 1;
            match self.fail_sets {
                Some(kind) => Err(injected(kind)),
                None => Ok(()),
            }
        }

        fn update_analytics(
            &mut self,
            _workout_id: Uuid,
            _metrics: &crate::types::DerivedMetrics,
        ) -> Result<(), StoreError> {
            self.order.push("analytics");
            self.analytics_calls += 1;
            match self.fail_analytics {
                Some(kind) => Err(injected(kind)),
                None => Ok(()),
            }
        }
    }

    fn sample_session() -> Session {
        let mut session = Session::new("Squat day");
        session.status = WorkoutStatus::Active;
        session.elapsed_seconds = 1200;
        session.exercise_mut("Squat").sets.push(Set {
            completed: true,
            ..Set::new(100.0, 5)
        });
        session
    }

    fn coordinator(store: MockStore) -> SaveCoordinator<MockStore> {
        SaveCoordinator::new(store, &Config::default())
    }

    #[test]
    fn test_steps_run_in_fixed_order() {
        let mut coord = coordinator(MockStore::default());
        let mut session = sample_session();

        coord.save(&mut session);

        assert_eq!(session.status, WorkoutStatus::Saved);
        assert!(session.save_progress.is_none());
        assert_eq!(coord.store().order, vec!["workout", "sets", "analytics"]);
    }

    #[test]
    fn test_first_step_failure_is_failed() {
        let mut coord = coordinator(MockStore {
            fail_workout: Some(StoreErrorKind::Network),
            ..Default::default()
        });
        let mut session = sample_session();

        coord.save(&mut session);

        assert_eq!(session.status, WorkoutStatus::Failed);
        let progress = session.save_progress.as_ref().unwrap();
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.errors[0].kind, WorkoutErrorKind::Network);
        assert!(progress.errors[0].recoverable);
        // Later steps never ran
        assert_eq!(coord.store().sets_calls, 0);
        assert_eq!(coord.store().analytics_calls, 0);
    }

    #[test]
    fn test_later_step_failure_is_partial() {
        let mut coord = coordinator(MockStore {
            fail_sets: Some(StoreErrorKind::Network),
            ..Default::default()
        });
        let mut session = sample_session();

        coord.save(&mut session);

        assert_eq!(session.status, WorkoutStatus::Partial);
        let progress = session.save_progress.as_ref().unwrap();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.step, SaveStep::ExerciseSets);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(coord.store().analytics_calls, 0);
    }

    #[test]
    fn test_retry_skips_succeeded_steps() {
        let mut coord = coordinator(MockStore {
            fail_sets: Some(StoreErrorKind::Network),
            ..Default::default()
        });
        let mut session = sample_session();

        coord.save(&mut session);
        assert_eq!(session.status, WorkoutStatus::Partial);

        coord.store_mut().fail_sets = None;
        coord.retry(&mut session);

        assert_eq!(session.status, WorkoutStatus::Saved);
        assert_eq!(coord.retry_count(), 1);
        // The workout header was upserted exactly once
        assert_eq!(coord.store().workout_calls, 1);
        assert_eq!(coord.store().sets_calls, 2);
        assert_eq!(coord.store().analytics_calls, 1);
    }

    #[test]
    fn test_retry_ignored_outside_failure_states() {
        let mut coord = coordinator(MockStore::default());
        let mut session = sample_session();

        coord.save(&mut session);
        assert_eq!(session.status, WorkoutStatus::Saved);

        coord.retry(&mut session);
        assert_eq!(coord.retry_count(), 0);
        assert_eq!(coord.store().workout_calls, 1);
    }

    #[test]
    fn test_validation_short_circuits_before_store() {
        let mut coord = coordinator(MockStore::default());
        let mut session = sample_session();
        session.elapsed_seconds = 90_000; // exceeds the one-day cap

        coord.save(&mut session);

        assert_eq!(session.status, WorkoutStatus::Failed);
        let progress = session.save_progress.as_ref().unwrap();
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.errors[0].kind, WorkoutErrorKind::Validation);
        assert_eq!(coord.store().workout_calls, 0);
        assert_eq!(coord.store().sets_calls, 0);
    }

    #[test]
    fn test_retry_after_validation_revalidates() {
        let mut coord = coordinator(MockStore::default());
        let mut session = sample_session();
        session.elapsed_seconds = 90_000;

        coord.save(&mut session);
        assert_eq!(session.status, WorkoutStatus::Failed);

        // User corrects the input; retry passes the gate and saves fully
        session.elapsed_seconds = 3_600;
        coord.retry(&mut session);
        assert_eq!(session.status, WorkoutStatus::Saved);
        assert_eq!(coord.store().workout_calls, 1);
    }

    #[test]
    fn test_recoverability_follows_policy() {
        let mut config = Config::default();
        config.recovery.database_recoverable = false;
        let mut coord = SaveCoordinator::new(
            MockStore {
                fail_sets: Some(StoreErrorKind::Database),
                ..Default::default()
            },
            &config,
        );
        let mut session = sample_session();

        coord.save(&mut session);

        let progress = session.save_progress.as_ref().unwrap();
        assert_eq!(progress.errors[0].kind, WorkoutErrorKind::Database);
        assert!(!progress.errors[0].recoverable);
    }

    #[test]
    fn test_retry_hydrates_from_persisted_progress() {
        // A partial save happened in a previous process; only the persisted
        // session carries the step bookkeeping.
        let mut session = sample_session();
        {
            let mut coord = coordinator(MockStore {
                fail_sets: Some(StoreErrorKind::Network),
                ..Default::default()
            });
            coord.save(&mut session);
            assert_eq!(session.status, WorkoutStatus::Partial);
        }

        // Fresh coordinator, as after an application restart
        let mut coord = coordinator(MockStore::default());
        coord.retry(&mut session);

        assert_eq!(session.status, WorkoutStatus::Saved);
        // The already-succeeded workout step was not re-run
        assert_eq!(coord.store().workout_calls, 0);
        assert_eq!(coord.store().sets_calls, 1);
        assert_eq!(coord.store().analytics_calls, 1);
    }

    #[test]
    fn test_errors_reset_per_attempt() {
        let mut coord = coordinator(MockStore {
            fail_sets: Some(StoreErrorKind::Network),
            ..Default::default()
        });
        let mut session = sample_session();

        coord.save(&mut session);
        coord.retry(&mut session); // still failing
        let progress = session.save_progress.as_ref().unwrap();
        // Errors are "so far this attempt", not an all-time log
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(coord.retry_count(), 1);
    }
}
