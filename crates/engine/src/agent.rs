//! The research agent boundary.
//!
//! An [`Agent`] turns a query plus context notes into a report. The engine
//! does not care how: the canned [`MockAgent`](crate::MockAgent) and the
//! network-backed `HttpAgent` are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use delve_core::{AgentSettings, SearchApi};

/// Error type for agent invocations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Network or transport failure.
    #[error("agent network error: {0}")]
    Network(String),

    /// The research service answered with an error status.
    #[error("agent API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the result contract.
    #[error("agent response parse error: {0}")]
    Parse(String),

    /// The configured agent cannot be used in this build or setup.
    #[error("agent unavailable: {0}")]
    Unavailable(String),
}

/// A message in the agent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// The state object handed to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub query: String,
    /// Context blob from `build_context`; empty when there is none.
    pub notes: String,
    pub messages: Vec<Message>,
}

impl AgentState {
    pub fn new(query: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            notes: notes.into(),
            messages: Vec::new(),
        }
    }
}

/// Per-stage model choices and limits, as the research framework names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configurable {
    pub research_model: String,
    pub final_report_model: String,
    pub compression_model: String,
    pub summarization_model: String,
    pub search_api: SearchApi,
    pub max_researcher_iterations: u32,
    pub max_concurrent_research_units: u32,
}

/// Runtime configuration handed to the agent alongside the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub recursion_limit: u32,
    pub configurable: Configurable,
}

impl From<&AgentSettings> for AgentConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            recursion_limit: settings.recursion_limit,
            configurable: Configurable {
                research_model: settings.research_model.clone(),
                final_report_model: settings.final_report_model.clone(),
                compression_model: settings.compression_model.clone(),
                summarization_model: settings.summarization_model.clone(),
                search_api: settings.search_api,
                max_researcher_iterations: settings.max_researcher_iterations,
                max_concurrent_research_units: settings.max_concurrent_research_units,
            },
        }
    }
}

/// What the agent returns. Missing fields default to empty or zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    #[serde(default)]
    pub final_report: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub trace_id: Option<String>,
}

/// A research agent: one operation, `run(state, config) -> result`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce a report for `state`. May take arbitrarily long.
    async fn run(&self, state: AgentState, config: &AgentConfig) -> Result<AgentResult, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_default_settings() {
        let config = AgentConfig::from(&AgentSettings::default());
        assert_eq!(config.recursion_limit, 5);
        assert_eq!(config.configurable.research_model, "openai:gpt-3.5-turbo");
        assert_eq!(config.configurable.search_api, SearchApi::None);
        assert_eq!(config.configurable.max_researcher_iterations, 2);
        assert_eq!(config.configurable.max_concurrent_research_units, 1);
    }

    #[test]
    fn config_wire_shape() {
        let json = serde_json::to_value(AgentConfig::from(&AgentSettings::default())).unwrap();
        assert_eq!(json["recursion_limit"], 5);
        assert_eq!(json["configurable"]["search_api"], "none");
        assert_eq!(json["configurable"]["final_report_model"], "openai:gpt-3.5-turbo");
    }

    #[test]
    fn result_fields_default_when_missing() {
        let result: AgentResult =
            serde_json::from_str(r#"{"final_report": "only a report"}"#).unwrap();
        assert_eq!(result.final_report, "only a report");
        assert!(result.sources.is_empty());
        assert_eq!(result.input_tokens, 0);
        assert_eq!(result.output_tokens, 0);
        assert!(result.trace_id.is_none());
    }

    #[test]
    fn state_starts_without_messages() {
        let state = AgentState::new("q", "notes");
        assert!(state.messages.is_empty());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({"query": "q", "notes": "notes", "messages": []}));
    }
}
