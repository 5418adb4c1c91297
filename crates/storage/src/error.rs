/// All errors that can be returned by a ResearchStorage implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No record with the given id.
    #[error("research record not found: {id}")]
    NotFound { id: String },

    /// The record already reached COMPLETED; completion happens exactly once.
    #[error("research record already completed: {id}")]
    AlreadyCompleted { id: String },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
