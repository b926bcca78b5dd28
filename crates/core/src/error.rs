use crate::types::DbId;
use crate::workflow::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// The stored row changed since the caller last read it. Reload and retry.
    #[error("Concurrency conflict: {entity} with id {id} was modified concurrently")]
    ConcurrencyConflict { entity: &'static str, id: DbId },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if this error is an optimistic-concurrency precondition failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::ConcurrencyConflict { .. })
    }
}
