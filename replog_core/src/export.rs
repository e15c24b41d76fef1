//! CSV export of saved workouts.
//!
//! Rolls the workout-header JSONL into a CSV archive for spreadsheet
//! analysis, then renames the JSONL out of the way. The CSV is synced to
//! disk before the JSONL is touched so a crash between the two steps can
//! only duplicate rows, never lose them.

use crate::store::read_workout_headers;
use crate::types::WorkoutHeader;
use crate::Result;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    name: String,
    performed_at: String,
    duration_seconds: u64,
    exercise_count: usize,
}

impl From<&WorkoutHeader> for CsvRow {
    fn from(header: &WorkoutHeader) -> Self {
        CsvRow {
            id: header.id.to_string(),
            name: header.name.clone(),
            performed_at: header.performed_at.to_rfc3339(),
            duration_seconds: header.duration_seconds,
            exercise_count: header.exercise_count,
        }
    }
}

/// Roll workout headers into CSV and archive the JSONL
///
/// This function:
/// 1. Reads all headers from the JSONL, collapsing upserts to the latest
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the JSONL to `.processed`
/// 5. Returns the number of workouts exported
pub fn headers_to_csv_and_archive(jsonl_path: &Path, csv_path: &Path) -> Result<usize> {
    let mut latest: HashMap<Uuid, WorkoutHeader> = HashMap::new();
    for header in read_workout_headers(jsonl_path)? {
        latest.insert(header.id, header);
    }
    let mut workouts: Vec<WorkoutHeader> = latest.into_values().collect();
    workouts.sort_by(|a, b| a.performed_at.cmp(&b.performed_at));

    if workouts.is_empty() {
        tracing::info!("No workouts to export");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Write the header row only when the file is new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for workout in &workouts {
        writer.serialize(CsvRow::from(workout))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to CSV", workouts.len());

    let processed_path = jsonl_path.with_extension("jsonl.processed");
    std::fs::rename(jsonl_path, &processed_path)?;
    tracing::debug!("Archived header log to {:?}", processed_path);

    Ok(workouts.len())
}
