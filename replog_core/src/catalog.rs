//! Built-in exercise catalog.
//!
//! Advisory only: exercise names in a session are free-form, but known
//! exercises contribute sensible default rest targets to the CLI.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Primary muscle group of a catalog exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Legs,
    Chest,
    Back,
    Shoulders,
    Arms,
    Core,
    FullBody,
}

/// One catalog entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    /// Suggested rest after a working set
    pub default_rest_seconds: u32,
}

/// The complete exercise catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    pub entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    /// Case-insensitive lookup by id or display name
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        let needle = name.trim().to_lowercase();
        self.entries
            .get(needle.as_str())
            .or_else(|| self.entries.values().find(|e| e.name.to_lowercase() == needle))
    }

    /// Sanity checks over the built-in data
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (key, entry) in &self.entries {
            if key != &entry.id {
                errors.push(format!("entry key '{}' does not match id '{}'", key, entry.id));
            }
            if entry.name.trim().is_empty() {
                errors.push(format!("entry '{}' has an empty name", entry.id));
            }
            if entry.default_rest_seconds == 0 {
                errors.push(format!("entry '{}' has a zero rest target", entry.id));
            }
        }
        errors
    }
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Default rest target for a known exercise name, if any
pub fn default_rest_for(name: &str) -> Option<u32> {
    get_default_catalog()
        .find(name)
        .map(|e| e.default_rest_seconds)
}

/// Builds the default catalog with built-in exercises
pub fn build_default_catalog() -> Catalog {
    let mut entries = HashMap::new();

    let mut insert = |id: &str, name: &str, muscle_group: MuscleGroup, rest: u32| {
        entries.insert(
            id.to_string(),
            CatalogEntry {
                id: id.to_string(),
                name: name.to_string(),
                muscle_group,
                default_rest_seconds: rest,
            },
        );
    };

    insert("squat", "Squat", MuscleGroup::Legs, 180);
    insert("deadlift", "Deadlift", MuscleGroup::Back, 180);
    insert("bench_press", "Bench Press", MuscleGroup::Chest, 150);
    insert("overhead_press", "Overhead Press", MuscleGroup::Shoulders, 150);
    insert("barbell_row", "Barbell Row", MuscleGroup::Back, 120);
    insert("pullup", "Pull-up", MuscleGroup::Back, 120);
    insert("dip", "Dip", MuscleGroup::Chest, 90);
    insert("barbell_curl", "Barbell Curl", MuscleGroup::Arms, 90);
    insert("plank", "Plank", MuscleGroup::Core, 60);
    insert("kettlebell_swing", "Kettlebell Swing", MuscleGroup::FullBody, 90);

    Catalog { entries }
}
