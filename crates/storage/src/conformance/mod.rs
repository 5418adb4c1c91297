//! Conformance test suite for `ResearchStorage` implementations.
//!
//! A backend-agnostic suite that any `ResearchStorage` implementation can run
//! to verify correctness. The suite covers:
//!
//! - **Lifecycle**: create/get/update/list round-trips and insertion order
//! - **Error handling**: correct error variants for invalid operations
//! - **Concurrency**: unique ids and single completion under parallel tasks
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use delve_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| async { open_test_sqlite().await }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod error;
mod lifecycle;

use std::fmt;
use std::future::Future;

use rust_decimal::Decimal;

use crate::record::{ResearchStatus, ResearchUpdate, TokenUsage};
use crate::ResearchStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "lifecycle", "error").
    pub category: String,
    /// Test name (e.g. "create_then_get_is_running").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ResearchStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(lifecycle::run_lifecycle_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

/// The update an engine writes when a run finishes.
fn completing_update(report: &str) -> ResearchUpdate {
    ResearchUpdate::new()
        .status(ResearchStatus::Completed)
        .report(report)
        .summary(report)
        .reasoning("conformance")
        .sources(vec!["source-a".to_string(), "source-b".to_string()])
        .tokens(TokenUsage::new(1200, 1800))
        .cost(Decimal::new(144, 3))
        .trace_id(Some("trace-1".to_string()))
}
