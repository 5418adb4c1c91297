use std::future::Future;

use super::{completing_update, TestResult};
use crate::record::{ResearchStatus, ResearchUpdate};
use crate::{ResearchStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "get_unknown_is_none",
            get_unknown_is_none(factory).await,
        ),
        TestResult::from_result(
            "error",
            "update_unknown_is_not_found",
            update_unknown_is_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "second_completion_is_rejected",
            second_completion_is_rejected(factory).await,
        ),
        TestResult::from_result(
            "error",
            "completed_record_rejects_revert_and_overwrite",
            completed_record_rejects_revert_and_overwrite(factory).await,
        ),
        TestResult::from_result(
            "error",
            "list_empty_store",
            list_empty_store(factory).await,
        ),
    ]
}

async fn get_unknown_is_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get("missing-id").await {
        Ok(None) => Ok(()),
        other => Err(format!("expected Ok(None), got {:?}", other)),
    }
}

async fn update_unknown_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.update("missing-id", ResearchUpdate::new().report("x")).await {
        Err(StorageError::NotFound { id }) if id == "missing-id" => Ok(()),
        other => Err(format!("expected NotFound {{ id: missing-id }}, got {:?}", other)),
    }
}

async fn second_completion_is_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s.create("q", None).await.map_err(|e| format!("create: {e}"))?;
    s.update(&id, completing_update("first"))
        .await
        .map_err(|e| format!("first completion: {e}"))?;

    match s.update(&id, completing_update("second")).await {
        Err(StorageError::AlreadyCompleted { .. }) => {}
        other => return Err(format!("expected AlreadyCompleted, got {:?}", other)),
    }

    let record = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("record vanished")?;
    match record.report.as_deref() {
        Some("first") => Ok(()),
        other => Err(format!("rejected completion changed report to {:?}", other)),
    }
}

async fn completed_record_rejects_revert_and_overwrite<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s.create("q", None).await.map_err(|e| format!("create: {e}"))?;
    s.update(&id, completing_update("first"))
        .await
        .map_err(|e| format!("first completion: {e}"))?;
    let before = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("record vanished")?;

    match s
        .update(&id, ResearchUpdate::new().status(ResearchStatus::Running))
        .await
    {
        Err(StorageError::AlreadyCompleted { .. }) => {}
        other => return Err(format!("revert to RUNNING: expected AlreadyCompleted, got {:?}", other)),
    }
    match s.update(&id, completing_update("second")).await {
        Err(StorageError::AlreadyCompleted { .. }) => {}
        other => return Err(format!("second completion: expected AlreadyCompleted, got {:?}", other)),
    }
    match s.update(&id, ResearchUpdate::new().report("third")).await {
        Err(StorageError::AlreadyCompleted { .. }) => {}
        other => return Err(format!("field overwrite: expected AlreadyCompleted, got {:?}", other)),
    }

    let after = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("record vanished")?;
    if after != before {
        return Err(format!("rejected updates changed the record: {:?}", after));
    }
    Ok(())
}

async fn list_empty_store<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let records = s.list().await.map_err(|e| format!("list: {e}"))?;
    if records.is_empty() {
        Ok(())
    } else {
        Err(format!("expected empty list, got {} records", records.len()))
    }
}
