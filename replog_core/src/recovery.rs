//! Abandoned-session detection and recovery.
//!
//! On load, a persisted snapshot whose status never reached `saved` means a
//! previous session was left in flight. The gate surfaces that as a
//! recoverable candidate and leaves every visible mutation to an explicit
//! user decision: resume or discard. Nothing is recovered silently.

use crate::snapshot::clear_snapshot;
use crate::types::{Session, WorkoutStatus};
use crate::Result;
use std::path::{Path, PathBuf};

/// Detects and resolves abandoned session snapshots
pub struct RecoveryGate {
    path: PathBuf,
}

impl RecoveryGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load whatever snapshot is persisted, recoverable or not.
    pub fn load(&self) -> Result<Option<Session>> {
        Session::load_snapshot(&self.path)
    }

    /// Whether a persisted session warrants the resume-or-discard prompt:
    /// its last known status was neither `Idle` nor `Saved` and it holds at
    /// least one exercise with at least one set.
    pub fn is_recoverable(session: &Session) -> bool {
        !matches!(session.status, WorkoutStatus::Idle | WorkoutStatus::Saved)
            && !session.is_empty()
    }

    /// Read the persisted snapshot and decide whether it is recoverable.
    /// Never mutates live state.
    pub fn detect(&self) -> Result<Option<Session>> {
        let Some(session) = self.load()? else {
            return Ok(None);
        };

        if !Self::is_recoverable(&session) {
            tracing::debug!(
                "Snapshot (status {:?}, {} sets) needs no recovery",
                session.status,
                session.total_sets()
            );
            return Ok(None);
        }

        tracing::info!(
            "Recoverable session '{}' found ({} exercises, {}s elapsed, status {:?})",
            session.name,
            session.exercises.len(),
            session.elapsed_seconds,
            session.status
        );
        Ok(Some(session))
    }

    /// Mark a detected session as resumed: back to `Active` with the
    /// recovery flag raised. The caller resets its elapsed clock to the
    /// session's `elapsed_seconds`, not to zero.
    pub fn mark_resumed(session: &mut Session) {
        session.status = WorkoutStatus::Active;
        session.recovered = true;
        tracing::info!(
            "Resumed session '{}' at {}s elapsed",
            session.name,
            session.elapsed_seconds
        );
    }

    /// Discard the persisted snapshot; the live session starts clean.
    pub fn discard(&self) -> Result<()> {
        clear_snapshot(&self.path)?;
        tracing::info!("Discarded persisted session snapshot");
        Ok(())
    }
}
