//! Saved-workout history loading.
//!
//! Reads workout headers from the JSONL store for display. Because the
//! store realizes upsert as append, the last record per id wins here.

use crate::store::read_workout_headers;
use crate::types::WorkoutHeader;
use crate::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Load saved workouts from the last N days, newest first
///
/// Upserted headers are collapsed to their latest version.
pub fn load_recent_workouts(headers_path: &Path, days: i64) -> Result<Vec<WorkoutHeader>> {
    let cutoff = Utc::now() - Duration::days(days);

    let mut latest: HashMap<Uuid, WorkoutHeader> = HashMap::new();
    for header in read_workout_headers(headers_path)? {
        // Later lines supersede earlier ones for the same workout
        latest.insert(header.id, header);
    }

    let mut workouts: Vec<WorkoutHeader> = latest
        .into_values()
        .filter(|h| h.performed_at >= cutoff)
        .collect();

    workouts.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));

    tracing::info!(
        "Loaded {} workouts from last {} days",
        workouts.len(),
        days
    );
    Ok(workouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonlStore, WorkoutStore};
    use crate::types::{Session, Set};
    use chrono::Duration;

    fn saved_header(store: &mut JsonlStore, name: &str, days_ago: i64) -> Uuid {
        let mut session = Session::new(name);
        session.started_at = Utc::now() - Duration::days(days_ago);
        session.exercise_mut("Squat").sets.push(Set {
            completed: true,
            ..Set::new(100.0, 5)
        });
        store.create_or_update_workout(&session.header()).unwrap();
        session.id
    }

    #[test]
    fn test_window_filters_old_workouts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path());

        saved_header(&mut store, "Recent A", 1);
        saved_header(&mut store, "Recent B", 3);
        saved_header(&mut store, "Old", 10);

        let workouts = load_recent_workouts(&store.headers_path(), 7).unwrap();
        assert_eq!(workouts.len(), 2);
    }

    #[test]
    fn test_sorted_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path());

        saved_header(&mut store, "Older", 5);
        saved_header(&mut store, "Newer", 1);

        let workouts = load_recent_workouts(&store.headers_path(), 7).unwrap();
        assert_eq!(workouts[0].name, "Newer");
        assert_eq!(workouts[1].name, "Older");
    }

    #[test]
    fn test_upserted_header_collapses_to_latest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path());

        let mut session = Session::new("Squat day");
        session.exercise_mut("Squat").sets.push(Set {
            completed: true,
            ..Set::new(100.0, 5)
        });
        store.create_or_update_workout(&session.header()).unwrap();

        // Retry path upserts with a corrected duration
        session.elapsed_seconds = 2_400;
        store.create_or_update_workout(&session.header()).unwrap();

        let workouts = load_recent_workouts(&store.headers_path(), 7).unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].duration_seconds, 2_400);
    }

    #[test]
    fn test_missing_store_is_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workouts =
            load_recent_workouts(&temp_dir.path().join("workouts.jsonl"), 7).unwrap();
        assert!(workouts.is_empty());
    }
}
