//! # Error Module
//!
//! Domain errors for the complaint lifecycle, built on thiserror.

use crate::complaint::ComplaintStatus;
use thiserror::Error;

/// Core domain errors.
///
/// None of these are fatal to the process: each one belongs to a single
/// operation and is surfaced to the caller for correction or retry.
#[derive(Debug, Error)]
pub enum CoreError {
    // === Submission errors ===
    #[error("Validation error: {0}")]
    Validation(String),

    // === Workflow errors ===
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    // === Identity errors ===
    #[error("Identifier already in use: {0}")]
    UniquenessConflict(String),

    // === Storage integrity ===
    #[error("Corrupt status history for {id}: {reason}")]
    CorruptHistory { id: String, reason: String },
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corrupt_history(id: &str, reason: impl Into<String>) -> Self {
        Self::CorruptHistory {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller should fix its input and resubmit
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    /// Whether the error maps to a user-facing conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. } | CoreError::UniquenessConflict(_)
        )
    }
}
