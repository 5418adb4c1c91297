//! End-to-end research runs against the in-memory store.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use delve_core::{
    extract_text_from_file, summarize_file_text, AgentMode, AgentSettings, UploadedFile,
};
use delve_engine::{
    agent_from_settings, Agent, AgentConfig, AgentError, AgentResult, AgentState, EngineError,
    MockAgent, ResearchEngine, ResearchRequest, MOCK_REPORT, RUN_REASONING,
};
use delve_storage::{InMemoryStorage, ResearchStatus, ResearchStorage, TokenUsage};

/// Agent that records every state it receives and answers with a fixed result.
struct RecordingAgent {
    seen: Arc<Mutex<Vec<AgentState>>>,
    result: AgentResult,
}

#[async_trait]
impl Agent for RecordingAgent {
    fn name(&self) -> &str {
        "recording"
    }

    async fn run(&self, state: AgentState, _config: &AgentConfig) -> Result<AgentResult, AgentError> {
        self.seen.lock().unwrap().push(state);
        Ok(self.result.clone())
    }
}

/// Agent that always fails.
struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    fn name(&self) -> &str {
        "failing"
    }

    async fn run(&self, _state: AgentState, _config: &AgentConfig) -> Result<AgentResult, AgentError> {
        Err(AgentError::Api {
            status: 503,
            message: "service down".to_string(),
        })
    }
}

fn mock_engine() -> (Arc<InMemoryStorage>, ResearchEngine) {
    let storage = Arc::new(InMemoryStorage::new());
    let engine = ResearchEngine::new(
        storage.clone(),
        Box::new(MockAgent::new()),
        AgentSettings::default(),
    );
    (storage, engine)
}

fn recording_engine(result: AgentResult) -> (Arc<Mutex<Vec<AgentState>>>, ResearchEngine) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let agent = RecordingAgent {
        seen: seen.clone(),
        result,
    };
    let engine = ResearchEngine::new(
        Arc::new(InMemoryStorage::new()),
        Box::new(agent),
        AgentSettings::default(),
    );
    (seen, engine)
}

#[tokio::test]
async fn plain_query_produces_mock_report_tokens_and_cost() {
    let (storage, engine) = mock_engine();
    let id = engine.run(ResearchRequest::new("X")).await.unwrap();

    let record = storage.get(&id).await.unwrap().expect("record stored");
    assert_eq!(record.query, "X");
    assert_eq!(record.status, ResearchStatus::Completed);
    assert_eq!(record.report.as_deref(), Some(MOCK_REPORT));
    assert_eq!(record.summary.as_deref(), Some(MOCK_REPORT));
    assert_eq!(record.reasoning.as_deref(), Some(RUN_REASONING));
    assert_eq!(record.tokens, TokenUsage::new(1200, 1800));
    assert_eq!(record.cost, Decimal::from_str("0.144").unwrap());
    assert_eq!(record.sources.len(), 3);
    assert_eq!(record.trace_id.as_deref(), Some("mock-trace-id"));
    assert!(record.parent_id.is_none());
}

#[tokio::test]
async fn each_run_adds_exactly_one_record() {
    let (storage, engine) = mock_engine();
    for n in 1..=3 {
        engine.run(ResearchRequest::new(format!("q{n}"))).await.unwrap();
        assert_eq!(storage.list().await.unwrap().len(), n);
    }
}

#[tokio::test]
async fn txt_upload_summary_reaches_agent() {
    let file = UploadedFile::new("notes.txt", "hello world");
    let text = extract_text_from_file(&file).unwrap();
    assert_eq!(text, "hello world");
    let summary = summarize_file_text(&text);
    assert_eq!(summary, "hello world");

    let (seen, engine) = recording_engine(AgentResult::default());
    engine
        .run(ResearchRequest::new("with file").file_summary(summary))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[0].notes,
        "User-provided document context:\nhello world"
    );
    assert_eq!(seen[0].query, "with file");
    assert!(seen[0].messages.is_empty());
}

#[tokio::test]
async fn continuation_passes_parent_summary_verbatim() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let storage = Arc::new(InMemoryStorage::new());
    let engine = ResearchEngine::new(
        storage.clone(),
        Box::new(RecordingAgent {
            seen: seen.clone(),
            result: AgentResult {
                final_report: "Parent findings about sleep and memory.".into(),
                ..AgentResult::default()
            },
        }),
        AgentSettings::default(),
    );

    let parent = engine.run(ResearchRequest::new("sleep")).await.unwrap();
    let parent_summary = storage.get(&parent).await.unwrap().unwrap().summary.unwrap();

    let child = engine
        .continue_from(&parent, "sleep and learning", None)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].notes.contains(&parent_summary));
    assert!(seen[1]
        .notes
        .starts_with("Previously researched topics (do not repeat):"));

    let child_record = storage.get(&child).await.unwrap().unwrap();
    assert_eq!(child_record.parent_id.as_deref(), Some(parent.as_str()));
}

#[tokio::test]
async fn continuation_from_unknown_parent_is_tolerated() {
    let (seen, engine) = recording_engine(AgentResult::default());
    let id = engine.continue_from("ghost", "q", None).await.unwrap();

    assert_eq!(seen.lock().unwrap()[0].notes, "");
    let record = engine.storage().get(&id).await.unwrap().unwrap();
    assert_eq!(record.parent_id.as_deref(), Some("ghost"));
}

#[tokio::test]
async fn summary_is_first_800_chars_of_report() {
    let report: String = "abcdefghij".repeat(100);
    let (_, engine) = recording_engine(AgentResult {
        final_report: report.clone(),
        ..AgentResult::default()
    });
    let id = engine.run(ResearchRequest::new("long")).await.unwrap();

    let record = engine.storage().get(&id).await.unwrap().unwrap();
    assert_eq!(record.report.as_deref(), Some(report.as_str()));
    assert_eq!(record.summary.unwrap(), report[..800]);
}

#[tokio::test]
async fn unpriced_cost_model_costs_zero() {
    let settings = AgentSettings {
        cost_model: "gpt-3.5-turbo".to_string(),
        ..AgentSettings::default()
    };
    let storage = Arc::new(InMemoryStorage::new());
    let engine = ResearchEngine::new(storage.clone(), Box::new(MockAgent::new()), settings);

    let id = engine.run(ResearchRequest::new("q")).await.unwrap();
    assert_eq!(storage.get(&id).await.unwrap().unwrap().cost, Decimal::ZERO);
}

#[tokio::test]
async fn agent_failure_propagates_and_leaves_record_running() {
    let storage = Arc::new(InMemoryStorage::new());
    let engine = ResearchEngine::new(
        storage.clone(),
        Box::new(FailingAgent),
        AgentSettings::default(),
    );

    let err = engine.run(ResearchRequest::new("q")).await.unwrap_err();
    assert!(matches!(err, EngineError::Agent(AgentError::Api { status: 503, .. })));

    let records = storage.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ResearchStatus::Running);
    assert!(records[0].report.is_none());
}

#[tokio::test]
async fn blank_query_is_rejected_before_storage() {
    let (storage, engine) = mock_engine();
    let err = engine.run(ResearchRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyQuery));
    assert!(storage.is_empty().await);
}

#[test]
fn mock_mode_selects_mock_agent() {
    let agent = agent_from_settings(&AgentSettings::default()).unwrap();
    assert_eq!(agent.name(), "mock");
}

#[cfg(feature = "remote")]
#[test]
fn remote_mode_selects_http_agent() {
    let settings = AgentSettings {
        mode: AgentMode::Remote,
        endpoint: "http://127.0.0.1:9/run".to_string(),
        ..AgentSettings::default()
    };
    assert_eq!(agent_from_settings(&settings).unwrap().name(), "http");
}

#[cfg(not(feature = "remote"))]
#[test]
fn remote_mode_without_feature_is_unavailable() {
    let settings = AgentSettings {
        mode: AgentMode::Remote,
        endpoint: "http://127.0.0.1:9/run".to_string(),
        ..AgentSettings::default()
    };
    let err = agent_from_settings(&settings).err().expect("should fail");
    assert!(matches!(err, EngineError::Agent(AgentError::Unavailable(_))));
}
