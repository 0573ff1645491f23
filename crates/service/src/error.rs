//! Service layer errors
//!
//! Typed failures callers can classify, carried through `anyhow` at the edges.

use civicdesk_core::{ComplaintStatus, CoreError};
use civicdesk_persistence::PersistenceError;
use thiserror::Error;

/// Complaint service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Complaint not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    #[error("Could not allocate a unique complaint id after {attempts} attempts")]
    UniquenessConflict { attempts: u32 },

    #[error("Complaint {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Persistence error: {0}")]
    Persistence(#[source] PersistenceError),

    #[error("Core error: {0}")]
    Core(#[source] CoreError),
}

/// Result type alias for service operations
pub type ServiceResult<T> = anyhow::Result<T>;

impl ServiceError {
    /// The request clashes with current state or with another writer
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::ConcurrentModification(_)
                | Self::UniquenessConflict { .. }
        )
    }

    /// Caller input was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Find the typed error inside an `anyhow` chain
    pub fn find(err: &anyhow::Error) -> Option<&ServiceError> {
        err.downcast_ref::<ServiceError>()
            .or_else(|| err.chain().find_map(|e| e.downcast_ref::<ServiceError>()))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            CoreError::UniquenessConflict(_) => Self::UniquenessConflict { attempts: 1 },
            other => Self::Core(other),
        }
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { id, .. } => Self::NotFound(id),
            PersistenceError::Conflict { id, .. } => Self::ConcurrentModification(id),
            PersistenceError::UniqueViolation(_) => Self::UniquenessConflict { attempts: 1 },
            PersistenceError::Core(core) => Self::from(core),
            other => Self::Persistence(other),
        }
    }
}
