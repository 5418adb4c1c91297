use delve_storage::StorageError;

use crate::agent::AgentError;

/// Errors surfaced by a research run. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The query was empty or whitespace.
    #[error("research query must not be empty")]
    EmptyQuery,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}
