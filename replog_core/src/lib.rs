#![forbid(unsafe_code)]

//! Core domain model and business logic for the replog workout logger.
//!
//! This crate provides:
//! - Domain types (sessions, exercises, sets, save progress)
//! - The session clocks (elapsed stopwatch, rest countdown)
//! - The multi-step save coordinator and its store boundary
//! - Session snapshot persistence and crash recovery
//! - History loading and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod elapsed;
pub mod rest;
pub mod catalog;
pub mod validate;
pub mod store;
pub mod snapshot;
pub mod save;
pub mod recovery;
pub mod session;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock};
pub use elapsed::ElapsedClock;
pub use rest::{RestSnapshot, RestTick, RestTimer};
pub use store::{JsonlStore, StoreError, StoreErrorKind, WorkoutStore};
pub use save::SaveCoordinator;
pub use recovery::RecoveryGate;
pub use session::{SessionTracker, TickOutcome};
pub use snapshot::clear_snapshot;
pub use catalog::{default_rest_for, get_default_catalog};
pub use history::load_recent_workouts;
pub use export::headers_to_csv_and_archive;
