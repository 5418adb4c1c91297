//! Process-lifetime storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{ResearchRecord, ResearchUpdate};
use crate::traits::ResearchStorage;

#[derive(Default)]
struct Table {
    /// Records in insertion order.
    records: Vec<ResearchRecord>,
    /// id -> position in `records`.
    index: HashMap<String, usize>,
}

/// In-memory research table. Contents vanish when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    table: RwLock<Table>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.table.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResearchStorage for InMemoryStorage {
    async fn create(&self, query: &str, parent_id: Option<&str>) -> Result<String, StorageError> {
        let mut table = self.table.write().await;

        let mut id = uuid::Uuid::new_v4().to_string();
        while table.index.contains_key(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        let record =
            ResearchRecord::running(id.clone(), query.to_string(), parent_id.map(str::to_owned));
        let position = table.records.len();
        table.records.push(record);
        table.index.insert(id.clone(), position);

        tracing::debug!(%id, parent = ?parent_id, "created research record");
        Ok(id)
    }

    async fn update(&self, id: &str, update: ResearchUpdate) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        let position = *table.index.get(id).ok_or_else(|| StorageError::NotFound {
            id: id.to_string(),
        })?;
        let record = &mut table.records[position];

        // A completed record is final: no reverts, no overwrites.
        if record.is_completed() {
            return Err(StorageError::AlreadyCompleted { id: id.to_string() });
        }

        update.apply_to(record);
        tracing::debug!(%id, status = %record.status, "updated research record");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ResearchRecord>, StorageError> {
        let table = self.table.read().await;
        Ok(table
            .index
            .get(id)
            .map(|&position| table.records[position].clone()))
    }

    async fn list(&self) -> Result<Vec<ResearchRecord>, StorageError> {
        Ok(self.table.read().await.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResearchStatus, TokenUsage};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn create_then_get_is_running_and_empty() {
        let storage = InMemoryStorage::new();
        let id = storage.create("What is CRISPR?", None).await.unwrap();

        let record = storage.get(&id).await.unwrap().expect("record exists");
        assert_eq!(record.id, id);
        assert_eq!(record.query, "What is CRISPR?");
        assert_eq!(record.status, ResearchStatus::Running);
        assert!(record.parent_id.is_none());
        assert!(record.report.is_none());
        assert!(record.summary.is_none());
        assert!(record.sources.is_empty());
        assert!(record.tokens.is_empty());
        assert_eq!(record.cost, Decimal::ZERO);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let storage = InMemoryStorage::new();
        let mut ids = std::collections::HashSet::new();
        for i in 0..50 {
            ids.insert(storage.create(&format!("q{i}"), None).await.unwrap());
        }
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn list_grows_by_one_per_create_in_order() {
        let storage = InMemoryStorage::new();
        assert!(storage.is_empty().await);

        let mut created = Vec::new();
        for (n, q) in ["first", "second", "third"].into_iter().enumerate() {
            created.push(storage.create(q, None).await.unwrap());
            assert_eq!(storage.list().await.unwrap().len(), n + 1);
        }

        let listed: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, created);
    }

    #[tokio::test]
    async fn completing_update_is_visible_all_at_once() {
        let storage = InMemoryStorage::new();
        let id = storage.create("q", None).await.unwrap();

        let update = ResearchUpdate::new()
            .status(ResearchStatus::Completed)
            .report("report")
            .summary("rep")
            .reasoning("why")
            .sources(vec!["FDA".into()])
            .tokens(TokenUsage::new(10, 20))
            .cost(Decimal::new(15, 4))
            .trace_id(Some("trace-1".into()));
        storage.update(&id, update).await.unwrap();

        let record = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, ResearchStatus::Completed);
        assert_eq!(record.report.as_deref(), Some("report"));
        assert_eq!(record.summary.as_deref(), Some("rep"));
        assert_eq!(record.reasoning.as_deref(), Some("why"));
        assert_eq!(record.sources, vec!["FDA".to_string()]);
        assert_eq!(record.tokens, TokenUsage::new(10, 20));
        assert_eq!(record.cost, Decimal::new(15, 4));
        assert_eq!(record.trace_id.as_deref(), Some("trace-1"));
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage
            .update("missing", ResearchUpdate::new().report("x"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::NotFound {
                id: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn completion_happens_once() {
        let storage = InMemoryStorage::new();
        let id = storage.create("q", None).await.unwrap();
        let done = || ResearchUpdate::new().status(ResearchStatus::Completed);

        storage.update(&id, done()).await.unwrap();
        let err = storage.update(&id, done()).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyCompleted { .. }));
    }

    #[tokio::test]
    async fn completed_record_is_frozen() {
        let storage = InMemoryStorage::new();
        let id = storage.create("q", None).await.unwrap();
        storage
            .update(&id, ResearchUpdate::new().status(ResearchStatus::Completed).report("first"))
            .await
            .unwrap();

        let revert = ResearchUpdate::new().status(ResearchStatus::Running);
        assert!(matches!(
            storage.update(&id, revert).await,
            Err(StorageError::AlreadyCompleted { .. })
        ));
        assert!(matches!(
            storage.update(&id, ResearchUpdate::new().report("third")).await,
            Err(StorageError::AlreadyCompleted { .. })
        ));

        let record = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, ResearchStatus::Completed);
        assert_eq!(record.report.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let storage = InMemoryStorage::new();
        assert!(storage.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dangling_parent_is_tolerated() {
        let storage = InMemoryStorage::new();
        let id = storage.create("child", Some("ghost")).await.unwrap();
        let record = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(record.parent_id.as_deref(), Some("ghost"));
        assert!(storage.get("ghost").await.unwrap().is_none());
    }
}
