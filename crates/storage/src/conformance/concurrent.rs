use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use super::{completing_update, TestResult};
use crate::{ResearchStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_creates_get_unique_ids",
            concurrent_creates_get_unique_ids(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_completions_exactly_one_wins",
            concurrent_completions_exactly_one_wins(factory).await,
        ),
    ]
}

/// N tasks create a record each; every id is distinct and listed.
async fn concurrent_creates_get_unique_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage.create(&format!("query {i}"), None).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle
            .await
            .map_err(|e| format!("task panicked: {e}"))?
            .map_err(|e| format!("create: {e}"))?;
        ids.insert(id);
    }
    if ids.len() != N {
        return Err(format!("expected {N} unique ids, got {}", ids.len()));
    }

    let listed = storage.list().await.map_err(|e| format!("list: {e}"))?;
    if listed.len() != N || !listed.iter().all(|r| ids.contains(&r.id)) {
        return Err(format!("list does not match created ids: {} records", listed.len()));
    }
    Ok(())
}

/// N tasks race to complete the same record. Exactly one succeeds; the rest
/// must get AlreadyCompleted.
async fn concurrent_completions_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let id = storage
        .create("contended", None)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let storage = Arc::clone(&storage);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            storage
                .update(&id, completing_update(&format!("report {i}")))
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.map_err(|e| format!("task panicked: {e}"))? {
            Ok(()) => wins += 1,
            Err(StorageError::AlreadyCompleted { .. }) => {}
            Err(other) => return Err(format!("unexpected error: {other}")),
        }
    }
    if wins == 1 {
        Ok(())
    } else {
        Err(format!("expected exactly one completion, got {wins}"))
    }
}
