//! Runs the backend-agnostic conformance suite against `InMemoryStorage`.

use delve_storage::conformance::run_conformance_suite;
use delve_storage::InMemoryStorage;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_storage_conforms() {
    let report = run_conformance_suite(|| async { InMemoryStorage::new() }).await;
    assert!(report.total > 0);
    assert_eq!(report.failed, 0, "{report}");
}
