use std::future::Future;

use rust_decimal::Decimal;

use super::{completing_update, TestResult};
use crate::record::{ResearchStatus, ResearchUpdate, TokenUsage};
use crate::ResearchStorage;

pub(super) async fn run_lifecycle_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "lifecycle",
            "create_then_get_is_running",
            create_then_get_is_running(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "parent_id_is_stored_unchecked",
            parent_id_is_stored_unchecked(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "completing_update_is_fully_visible",
            completing_update_is_fully_visible(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "partial_update_keeps_other_fields",
            partial_update_keeps_other_fields(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "list_grows_in_insertion_order",
            list_grows_in_insertion_order(factory).await,
        ),
    ]
}

async fn create_then_get_is_running<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s
        .create("What is CRISPR?", None)
        .await
        .map_err(|e| format!("create: {e}"))?;
    let record = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("created record not found")?;

    if record.id != id || record.query != "What is CRISPR?" {
        return Err(format!("wrong id/query: {:?}", record));
    }
    if record.status != ResearchStatus::Running {
        return Err(format!("expected RUNNING, got {}", record.status));
    }
    if record.report.is_some()
        || record.summary.is_some()
        || record.reasoning.is_some()
        || !record.sources.is_empty()
        || !record.tokens.is_empty()
        || record.cost != Decimal::ZERO
        || record.trace_id.is_some()
    {
        return Err(format!("result fields not empty: {:?}", record));
    }
    Ok(())
}

async fn parent_id_is_stored_unchecked<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s
        .create("follow-up", Some("no-such-parent"))
        .await
        .map_err(|e| format!("create with dangling parent: {e}"))?;
    let record = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("created record not found")?;
    match record.parent_id.as_deref() {
        Some("no-such-parent") => Ok(()),
        other => Err(format!("expected parent 'no-such-parent', got {:?}", other)),
    }
}

async fn completing_update_is_fully_visible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s.create("q", None).await.map_err(|e| format!("create: {e}"))?;
    s.update(&id, completing_update("the report"))
        .await
        .map_err(|e| format!("update: {e}"))?;

    let record = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("record vanished")?;
    if record.status != ResearchStatus::Completed {
        return Err(format!("expected COMPLETED, got {}", record.status));
    }
    if record.report.as_deref() != Some("the report")
        || record.summary.as_deref() != Some("the report")
        || record.reasoning.as_deref() != Some("conformance")
        || record.sources.len() != 2
        || record.tokens != TokenUsage::new(1200, 1800)
        || record.cost != Decimal::new(144, 3)
        || record.trace_id.as_deref() != Some("trace-1")
    {
        return Err(format!("update not fully applied: {:?}", record));
    }
    Ok(())
}

async fn partial_update_keeps_other_fields<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = s
        .create("q", Some("p"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    s.update(&id, ResearchUpdate::new().report("draft"))
        .await
        .map_err(|e| format!("update: {e}"))?;

    let record = s
        .get(&id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("record vanished")?;
    if record.report.as_deref() != Some("draft") {
        return Err(format!("report not written: {:?}", record.report));
    }
    if record.status != ResearchStatus::Running
        || record.query != "q"
        || record.parent_id.as_deref() != Some("p")
    {
        return Err(format!("untouched fields changed: {:?}", record));
    }
    Ok(())
}

async fn list_grows_in_insertion_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut created = Vec::new();
    for (n, q) in ["first", "second", "third"].into_iter().enumerate() {
        created.push(s.create(q, None).await.map_err(|e| format!("create: {e}"))?);
        let len = s.list().await.map_err(|e| format!("list: {e}"))?.len();
        if len != n + 1 {
            return Err(format!("after {} creates list has {} records", n + 1, len));
        }
    }

    s.update(&created[0], completing_update("done"))
        .await
        .map_err(|e| format!("update: {e}"))?;

    let listed: Vec<String> = s
        .list()
        .await
        .map_err(|e| format!("list: {e}"))?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if listed != created {
        return Err(format!("expected order {:?}, got {:?}", created, listed));
    }
    Ok(())
}
