//! Workout store boundary and the bundled JSONL-backed implementation.
//!
//! The save coordinator only ever talks to a [`WorkoutStore`]; remote
//! backends implement the trait however they like. The bundled
//! [`JsonlStore`] persists to append-only JSON Lines files with file
//! locking, with upsert-by-id realized as append plus last-record-wins on
//! read.

use crate::types::{DerivedMetrics, SetRecord, WorkoutHeader};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Failure classification surfaced by a store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Transport-level failure
    Network,
    /// Constraint or integrity failure on the store side
    Database,
    /// Anything the store could not classify
    Unknown,
}

/// Error returned by store operations
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Database,
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unknown,
            message: message.into(),
        }
    }
}

/// Remote persistence collaborator for finished workouts
pub trait WorkoutStore {
    /// Create or update the workout header record. Idempotent by id: a
    /// second call with the same header id updates rather than duplicates.
    fn create_or_update_workout(&mut self, header: &WorkoutHeader) -> Result<Uuid, StoreError>;

    /// Bulk-write all attempted sets for the workout.
    fn write_exercise_sets(
        &mut self,
        workout_id: Uuid,
        sets: &[SetRecord],
    ) -> Result<(), StoreError>;

    /// Write the derived aggregate update.
    fn update_analytics(
        &mut self,
        workout_id: Uuid,
        metrics: &DerivedMetrics,
    ) -> Result<(), StoreError>;
}

/// One batch of sets as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetBatch {
    pub workout_id: Uuid,
    pub sets: Vec<SetRecord>,
    pub written_at: DateTime<Utc>,
}

/// One analytics update as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub workout_id: Uuid,
    pub metrics: DerivedMetrics,
    pub updated_at: DateTime<Utc>,
}

/// JSONL-backed workout store with file locking
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn headers_path(&self) -> PathBuf {
        self.dir.join("workouts.jsonl")
    }

    pub fn sets_path(&self) -> PathBuf {
        self.dir.join("sets.jsonl")
    }

    pub fn analytics_path(&self) -> PathBuf {
        self.dir.join("analytics.jsonl")
    }

    fn append_line<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::database(format!("create store dir: {}", e)))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::database(format!("open {:?}: {}", path, e)))?;

        file.lock_exclusive()
            .map_err(|e| StoreError::database(format!("lock {:?}: {}", path, e)))?;

        let result = (|| {
            let mut writer = std::io::BufWriter::new(&file);
            let line = serde_json::to_string(record)
                .map_err(|e| StoreError::database(format!("serialize record: {}", e)))?;
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .and_then(|_| writer.flush())
                .map_err(|e| StoreError::database(format!("write {:?}: {}", path, e)))
        })();

        let _ = file.unlock();
        result
    }
}

impl WorkoutStore for JsonlStore {
    fn create_or_update_workout(&mut self, header: &WorkoutHeader) -> Result<Uuid, StoreError> {
        self.append_line(&self.headers_path(), header)?;
        tracing::debug!("Upserted workout header {}", header.id);
        Ok(header.id)
    }

    fn write_exercise_sets(
        &mut self,
        workout_id: Uuid,
        sets: &[SetRecord],
    ) -> Result<(), StoreError> {
        let batch = SetBatch {
            workout_id,
            sets: sets.to_vec(),
            written_at: Utc::now(),
        };
        self.append_line(&self.sets_path(), &batch)?;
        tracing::debug!("Wrote {} sets for workout {}", sets.len(), workout_id);
        Ok(())
    }

    fn update_analytics(
        &mut self,
        workout_id: Uuid,
        metrics: &DerivedMetrics,
    ) -> Result<(), StoreError> {
        let record = AnalyticsRecord {
            workout_id,
            metrics: metrics.clone(),
            updated_at: Utc::now(),
        };
        self.append_line(&self.analytics_path(), &record)?;
        tracing::debug!("Updated analytics for workout {}", workout_id);
        Ok(())
    }
}

/// Read all workout headers from a JSONL file
///
/// Malformed lines are skipped with a warning rather than failing the read.
/// Callers that want upsert semantics keep the last record per id.
pub fn read_workout_headers(path: &Path) -> crate::Result<Vec<WorkoutHeader>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut headers = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutHeader>(&line) {
            Ok(header) => headers.push(header),
            Err(e) => {
                tracing::warn!("Failed to parse workout header at line {}: {}", line_num + 1, e);
                // Continue reading, don't fail completely
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workout headers", headers.len());
    Ok(headers)
}
