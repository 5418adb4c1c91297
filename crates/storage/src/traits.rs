use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{ResearchRecord, ResearchUpdate};

/// The storage capability the research engine and presentation layer share.
///
/// ## Lifecycle
///
/// 1. `create()` inserts a RUNNING record with empty result fields
/// 2. `update()` merges the finished results and flips the status to
///    COMPLETED in one step; readers never see a half-written record
///
/// Records are never deleted.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait ResearchStorage: Send + Sync + 'static {
    /// Insert a new RUNNING record and return its freshly generated id.
    ///
    /// `parent_id` is stored as given; it is not required to exist.
    async fn create(&self, query: &str, parent_id: Option<&str>) -> Result<String, StorageError>;

    /// Merge `update` into the record with this id, atomically.
    ///
    /// Returns `Err(StorageError::NotFound)` for an unknown id and
    /// `Err(StorageError::AlreadyCompleted)` for any update to a record that
    /// is already COMPLETED.
    async fn update(&self, id: &str, update: ResearchUpdate) -> Result<(), StorageError>;

    /// Read one record. `Ok(None)` when the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<ResearchRecord>, StorageError>;

    /// Every record, in insertion order.
    async fn list(&self) -> Result<Vec<ResearchRecord>, StorageError>;
}
