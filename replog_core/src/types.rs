//! Core domain types for the replog workout logger.
//!
//! This module defines the fundamental types used throughout the system:
//! - Sessions, exercises and sets
//! - Save status, step and progress tracking
//! - Error records surfaced by the save coordinator
//! - Records handed to the workout store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Status and Save Types
// ============================================================================

/// Lifecycle status of a workout session
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    #[default]
    Idle,
    Active,
    Saving,
    /// Terminal success
    Saved,
    /// The very first save step failed; terminal until retried
    Failed,
    /// Some save steps succeeded, at least one failed
    Partial,
    /// Rehydrating from a persisted snapshot
    Recovering,
}

/// One ordered phase of the multi-step save
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SaveStep {
    Workout,
    ExerciseSets,
    Analytics,
}

impl SaveStep {
    /// Fixed execution order; must never be reordered
    pub const ORDER: [SaveStep; 3] = [SaveStep::Workout, SaveStep::ExerciseSets, SaveStep::Analytics];

    /// Position of this step in the execution order
    pub fn index(self) -> usize {
        match self {
            SaveStep::Workout => 0,
            SaveStep::ExerciseSets => 1,
            SaveStep::Analytics => 2,
        }
    }
}

/// Classification of a save failure
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutErrorKind {
    Network,
    Database,
    Validation,
    Unknown,
}

/// One failure record from a save attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutError {
    pub kind: WorkoutErrorKind,
    pub message: String,
    pub details: Option<String>,
    pub at: DateTime<Utc>,
    /// Whether a retry of the same step is sensible
    pub recoverable: bool,
}

/// Snapshot of an in-flight multi-step save
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveProgress {
    pub step: SaveStep,
    pub total: usize,
    pub completed: usize,
    /// Errors encountered so far this attempt, in order
    pub errors: Vec<WorkoutError>,
}

impl SaveProgress {
    pub fn starting() -> Self {
        Self {
            step: SaveStep::Workout,
            total: SaveStep::ORDER.len(),
            completed: 0,
            errors: Vec::new(),
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// One performance of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Set {
    /// Non-negative, unit-agnostic at this layer
    pub weight: f64,
    pub reps: u32,
    /// Target rest after this set, if any
    pub rest_target_seconds: Option<u32>,
    /// Volume only counts completed sets
    pub completed: bool,
    /// UI-transient flag, never persisted
    #[serde(skip)]
    pub editing: bool,
}

impl Set {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            weight,
            reps,
            rest_target_seconds: None,
            completed: false,
            editing: false,
        }
    }

    /// Recomputed on demand, never stored stale
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// An exercise entry with its ordered sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<Set>,
}

/// The in-progress workout
///
/// Exercises keep insertion order (display order). The session is owned by a
/// single writer; clocks and the save coordinator request mutations through
/// its owner rather than touching fields directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub elapsed_seconds: u64,
    pub status: WorkoutStatus,
    /// Present only while a save attempt is live or has failed; cleared on success
    pub save_progress: Option<SaveProgress>,
    /// True if this session was rehydrated from persisted storage
    pub recovered: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises: Vec::new(),
            elapsed_seconds: 0,
            status: WorkoutStatus::Idle,
            save_progress: None,
            recovered: false,
            started_at: now,
            updated_at: now,
        }
    }

    /// Look up an exercise entry by name
    pub fn exercise(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Find or insert an exercise entry, preserving insertion order
    pub fn exercise_mut(&mut self, name: &str) -> &mut Exercise {
        if let Some(idx) = self.exercises.iter().position(|e| e.name == name) {
            return &mut self.exercises[idx];
        }
        self.exercises.push(Exercise {
            name: name.to_string(),
            sets: Vec::new(),
        });
        self.exercises.last_mut().expect("just pushed")
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .count()
    }

    /// Total volume across completed sets only
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .map(Set::volume)
            .sum()
    }

    /// True when no exercise entry holds at least one set
    pub fn is_empty(&self) -> bool {
        self.exercises.iter().all(|e| e.sets.is_empty())
    }

    /// Header record for the workout store
    pub fn header(&self) -> WorkoutHeader {
        WorkoutHeader {
            id: self.id,
            name: self.name.clone(),
            performed_at: self.started_at,
            duration_seconds: self.elapsed_seconds,
            exercise_count: self.exercises.len(),
        }
    }

    /// Flattened set records for the workout store
    pub fn set_records(&self) -> Vec<SetRecord> {
        self.exercises
            .iter()
            .flat_map(|e| {
                e.sets.iter().enumerate().map(move |(i, s)| SetRecord {
                    exercise: e.name.clone(),
                    position: i,
                    weight: s.weight,
                    reps: s.reps,
                    completed: s.completed,
                })
            })
            .collect()
    }

    /// Derived aggregates for the analytics store update
    pub fn derived_metrics(&self) -> DerivedMetrics {
        let exercise_volume = self
            .exercises
            .iter()
            .map(|e| {
                let vol = e
                    .sets
                    .iter()
                    .filter(|s| s.completed)
                    .map(Set::volume)
                    .sum();
                (e.name.clone(), vol)
            })
            .collect();

        DerivedMetrics {
            total_volume: self.total_volume(),
            completed_sets: self.completed_sets(),
            exercise_volume,
        }
    }
}

// ============================================================================
// Store-Facing Records
// ============================================================================

/// Workout header record; upserted by id
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutHeader {
    pub id: Uuid,
    pub name: String,
    pub performed_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub exercise_count: usize,
}

/// One set as written to the store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetRecord {
    pub exercise: String,
    pub position: usize,
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

/// Derived aggregates written in the analytics step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_volume: f64,
    pub completed_sets: usize,
    pub exercise_volume: Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_is_weight_times_reps() {
        let set = Set::new(100.0, 5);
        assert_eq!(set.volume(), 500.0);
    }

    #[test]
    fn test_total_volume_counts_completed_only() {
        let mut session = Session::new("Leg day");
        let entry = session.exercise_mut("Squat");
        entry.sets.push(Set {
            completed: true,
            ..Set::new(100.0, 5)
        });
        entry.sets.push(Set::new(100.0, 5)); // not completed

        assert_eq!(session.total_volume(), 500.0);
        assert_eq!(session.completed_sets(), 1);
        assert_eq!(session.total_sets(), 2);
    }

    #[test]
    fn test_exercise_insertion_order_preserved() {
        let mut session = Session::new("Push day");
        session.exercise_mut("Bench Press");
        session.exercise_mut("Overhead Press");
        session.exercise_mut("Bench Press"); // existing entry, no duplicate

        let names: Vec<_> = session.exercises.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bench Press", "Overhead Press"]);
    }

    #[test]
    fn test_editing_flag_not_serialized() {
        let mut set = Set::new(60.0, 8);
        set.editing = true;

        let json = serde_json::to_string(&set).unwrap();
        assert!(!json.contains("editing"));

        let back: Set = serde_json::from_str(&json).unwrap();
        assert!(!back.editing);
    }

    #[test]
    fn test_set_records_keep_positions() {
        let mut session = Session::new("Pull day");
        let entry = session.exercise_mut("Deadlift");
        entry.sets.push(Set::new(140.0, 5));
        entry.sets.push(Set::new(150.0, 3));

        let records = session.set_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, 0);
        assert_eq!(records[1].position, 1);
        assert_eq!(records[1].weight, 150.0);
    }

    #[test]
    fn test_derived_metrics_per_exercise() {
        let mut session = Session::new("Full body");
        session.exercise_mut("Squat").sets.push(Set {
            completed: true,
            ..Set::new(100.0, 5)
        });
        session.exercise_mut("Row").sets.push(Set::new(60.0, 10));

        let metrics = session.derived_metrics();
        assert_eq!(metrics.total_volume, 500.0);
        assert_eq!(metrics.completed_sets, 1);
        assert_eq!(metrics.exercise_volume.len(), 2);
        assert_eq!(metrics.exercise_volume[0], ("Squat".to_string(), 500.0));
        assert_eq!(metrics.exercise_volume[1], ("Row".to_string(), 0.0));
    }

    #[test]
    fn test_save_step_order() {
        assert_eq!(SaveStep::ORDER[0].index(), 0);
        assert_eq!(SaveStep::ORDER[1], SaveStep::ExerciseSets);
        assert_eq!(SaveStep::ORDER[2], SaveStep::Analytics);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&WorkoutStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
        let json = serde_json::to_string(&SaveStep::ExerciseSets).unwrap();
        assert_eq!(json, "\"exercise-sets\"");
    }
}
