//! Error types.

use thiserror::Error;

/// Errors raised while building an environment or configuring a search.
///
/// Failing to reach a zero-fitness timetable is not an error; the search
/// results report it through their `reached_final` flag.
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("failed to read descriptor: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid constraint {constraint:?} for professor {professor}")]
    InvalidConstraint {
        professor: String,
        constraint: String,
    },

    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for timetable operations.
pub type Result<T> = std::result::Result<T, TimetableError>;
