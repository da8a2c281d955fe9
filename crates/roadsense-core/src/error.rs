//! Error types for the report store and sync path

use std::io;
use thiserror::Error;

/// Failures raised by a persistence backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// I/O error while reading or writing a document
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Stored document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend refused the write because it is full
    #[error("storage capacity exceeded while writing '{key}' ({needed} bytes, {available} available)")]
    CapacityExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
}

/// Errors surfaced by [`LocalReportStore`](crate::store::LocalReportStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A report with the same id is already stored
    #[error("report '{0}' already exists")]
    DuplicateId(String),

    /// No report with the given id
    #[error("report '{0}' not found")]
    NotFound(String),

    /// Confidence outside the closed unit interval
    #[error("report '{id}' has confidence {confidence} outside [0, 1]")]
    InvalidConfidence { id: String, confidence: f64 },

    /// A mutator tried to change the id or un-sync a report
    #[error("rejected mutation of report '{0}': id is immutable and synced may only go false -> true")]
    InvalidMutation(String),

    /// The persistence backend failed; the store is unchanged
    #[error("storage backend failure: {0}")]
    Backend(#[from] BackendError),
}

/// Failures reported by a remote report sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote could not be reached
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The remote answered but refused the report
    #[error("remote rejected report: {0}")]
    Rejected(String),
}
