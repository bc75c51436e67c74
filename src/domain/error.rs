//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent violations of the tree and chronology rules.
/// All of them are fatal for a generation run.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("cannot resolve node path '{path}': {reason}")]
    Resolution { path: String, reason: String },

    #[error("{0}")]
    Chrono(#[from] ChronoDecodeError),

    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },
}

/// Failure to derive a chronological key from an event date.
///
/// Unknown markers and malformed numbers are kept apart so the operator
/// can tell a typo in the calendar grammar from garbage input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChronoDecodeError {
    #[error("unknown calendar marker '{marker}' in date '{date}'")]
    UnknownMarker { date: String, marker: String },

    #[error("malformed number '{token}' in date '{date}'")]
    MalformedNumber { date: String, token: String },

    #[error("event has no usable Date: {event}")]
    MissingDate { event: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
