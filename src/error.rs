//! Unified error types for rosterdb.
//!
//! This module provides the canonical error type for all roster operations.
//! Validation and uniqueness failures are reported before any store mutation;
//! persistence failures leave the in-memory store untouched.

use thiserror::Error;

/// All rosterdb errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range field, rejected before any mutation
    #[error("validation failed: {0}")]
    Validation(String),

    /// A member with this student ID already exists
    #[error("duplicate student ID: {0}")]
    DuplicateStudentId(String),

    /// No member at that id / student ID
    #[error("not found: {0}")]
    NotFound(String),

    /// Rank transition not possible (boundary rank, or rank change via update)
    #[error("invalid rank transition: {0}")]
    InvalidTransition(String),

    /// Operation not valid for the member's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O error during snapshot export/import
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error during snapshot export/import
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for rosterdb operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::DuplicateStudentId(_))
    }

    /// Check if this is a persistence failure (store contents unaffected).
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Serialization(_))
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
