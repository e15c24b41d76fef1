//! Pre-save validation gate.
//!
//! The full session is checked against the configured limits before the
//! first save step; a failure here never reaches the store.

use crate::config::LimitsConfig;
use crate::types::Session;

/// Validate a session against fixed rules, returning every issue found.
///
/// An empty result means the session may proceed to the store.
pub fn validate_session(session: &Session, limits: &LimitsConfig) -> Vec<String> {
    let mut issues = Vec::new();

    if session.name.trim().is_empty() {
        issues.push("workout name must not be empty".to_string());
    }
    if session.name.chars().count() > limits.max_name_len {
        issues.push(format!(
            "workout name exceeds {} characters",
            limits.max_name_len
        ));
    }

    if session.elapsed_seconds > limits.max_duration_seconds {
        issues.push(format!(
            "duration {}s exceeds maximum {}s",
            session.elapsed_seconds, limits.max_duration_seconds
        ));
    }

    for exercise in &session.exercises {
        if exercise.sets.is_empty() {
            issues.push(format!("exercise '{}' has no sets recorded", exercise.name));
            continue;
        }

        for (i, set) in exercise.sets.iter().enumerate() {
            if !set.weight.is_finite() || set.weight < 0.0 {
                issues.push(format!(
                    "exercise '{}' set {}: weight must be a non-negative number",
                    exercise.name,
                    i + 1
                ));
            } else if set.weight > limits.max_weight {
                issues.push(format!(
                    "exercise '{}' set {}: weight {} exceeds maximum {}",
                    exercise.name,
                    i + 1,
                    set.weight,
                    limits.max_weight
                ));
            }

            if set.reps > limits.max_reps {
                issues.push(format!(
                    "exercise '{}' set {}: reps {} exceeds maximum {}",
                    exercise.name,
                    i + 1,
                    set.reps,
                    limits.max_reps
                ));
            }
        }
    }

    issues
}
