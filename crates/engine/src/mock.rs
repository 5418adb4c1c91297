use async_trait::async_trait;

use crate::agent::{Agent, AgentConfig, AgentError, AgentResult, AgentState};

/// Report text returned by the default mock agent.
pub const MOCK_REPORT: &str = "This is a mock deep research report on the impact of AI \
in healthcare diagnostics. AI is improving early disease detection, reducing diagnostic \
errors, and supporting clinical decision-making through imaging and data analysis.";

/// Sources returned by the default mock agent.
pub const MOCK_SOURCES: [&str; 3] = ["World Health Organization (WHO)", "FDA", "Nature Medicine"];

pub const MOCK_INPUT_TOKENS: u64 = 1200;
pub const MOCK_OUTPUT_TOKENS: u64 = 1800;
pub const MOCK_TRACE_ID: &str = "mock-trace-id";

/// Dry-run agent: returns a fixed result without touching the network.
#[derive(Debug, Clone)]
pub struct MockAgent {
    result: AgentResult,
}

impl MockAgent {
    /// The canned healthcare-diagnostics result.
    pub fn new() -> Self {
        Self::with_result(AgentResult {
            final_report: MOCK_REPORT.to_string(),
            sources: MOCK_SOURCES.iter().map(|s| s.to_string()).collect(),
            input_tokens: MOCK_INPUT_TOKENS,
            output_tokens: MOCK_OUTPUT_TOKENS,
            trace_id: Some(MOCK_TRACE_ID.to_string()),
        })
    }

    /// A mock that always answers with `result`.
    pub fn with_result(result: AgentResult) -> Self {
        Self { result }
    }
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, state: AgentState, _config: &AgentConfig) -> Result<AgentResult, AgentError> {
        tracing::debug!(query = %state.query, "mock agent returning canned result");
        Ok(self.result.clone())
    }
}
