//! Errors raised by the zoo
//!
//! Expected absence (a mutant lookup that finds nothing) is an `Option`, not an
//! error. Everything here propagates to the caller.

use crate::storage::migrate::MigrationFailure;

/// Zoo-related errors
#[derive(Debug, thiserror::Error)]
pub enum ZooError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Exhausted all {space} possible mutant names")]
    Exhausted { space: usize },

    #[error("Migration failed for {} item(s) ({archived} archived): {}", .failures.len(), summarize(.failures))]
    Migration {
        failures: Vec<MigrationFailure>,
        archived: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn summarize(failures: &[MigrationFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
