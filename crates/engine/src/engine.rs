//! One research run, end to end.
//!
//! Pipeline:
//! 1. Create a RUNNING record
//! 2. Build the context blob from the optional summaries
//! 3. Invoke the configured agent
//! 4. Derive summary (first 800 chars), tokens and cost
//! 5. Write every result field and COMPLETED in a single update
//!
//! A failure at any step propagates to the caller; the record is left
//! RUNNING.

use std::sync::Arc;

use delve_core::{build_context, estimate_cost, truncate_chars, AgentMode, AgentSettings};
use delve_storage::{ResearchStatus, ResearchStorage, ResearchUpdate, TokenUsage};

use crate::agent::{Agent, AgentConfig, AgentState};
use crate::error::EngineError;
use crate::mock::MockAgent;

/// Characters of the report kept as the record summary.
pub const REPORT_SUMMARY_CHARS: usize = 800;

/// Fixed description stored on every completed record.
pub const RUN_REASONING: &str = "Research executed using a controlled LangGraph workflow with \
planning, analysis, and final synthesis.";

/// Inputs to one research run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchRequest {
    pub query: String,
    pub parent_id: Option<String>,
    pub parent_summary: Option<String>,
    pub file_summary: Option<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn parent(mut self, id: impl Into<String>, summary: Option<String>) -> Self {
        self.parent_id = Some(id.into());
        self.parent_summary = summary;
        self
    }

    pub fn file_summary(mut self, summary: impl Into<String>) -> Self {
        self.file_summary = Some(summary.into());
        self
    }
}

/// Build the agent selected by `settings.mode`.
pub fn agent_from_settings(settings: &AgentSettings) -> Result<Box<dyn Agent>, EngineError> {
    match settings.mode {
        AgentMode::Mock => Ok(Box::new(MockAgent::new())),
        #[cfg(feature = "remote")]
        AgentMode::Remote => Ok(Box::new(crate::http::HttpAgent::new(
            settings.endpoint.clone(),
            Some(settings.api_key.clone()),
        ))),
        #[cfg(not(feature = "remote"))]
        AgentMode::Remote => Err(EngineError::Agent(crate::agent::AgentError::Unavailable(
            "remote agent support was not compiled in (enable the `remote` feature)".to_string(),
        ))),
    }
}

/// Runs research sessions against a storage backend and an agent.
pub struct ResearchEngine {
    storage: Arc<dyn ResearchStorage>,
    agent: Box<dyn Agent>,
    settings: AgentSettings,
}

impl ResearchEngine {
    pub fn new(
        storage: Arc<dyn ResearchStorage>,
        agent: Box<dyn Agent>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            storage,
            agent,
            settings,
        }
    }

    /// Engine whose agent is chosen by configuration.
    pub fn from_settings(
        storage: Arc<dyn ResearchStorage>,
        settings: AgentSettings,
    ) -> Result<Self, EngineError> {
        let agent = agent_from_settings(&settings)?;
        Ok(Self::new(storage, agent, settings))
    }

    pub fn storage(&self) -> &Arc<dyn ResearchStorage> {
        &self.storage
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }

    /// Run one research session to completion and return the record id.
    pub async fn run(&self, request: ResearchRequest) -> Result<String, EngineError> {
        if request.query.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let id = self
            .storage
            .create(&request.query, request.parent_id.as_deref())
            .await?;
        tracing::info!(%id, agent = self.agent.name(), parent = ?request.parent_id, "research run started");

        let notes = build_context(
            request.parent_summary.as_deref(),
            request.file_summary.as_deref(),
        );
        let state = AgentState::new(request.query, notes);
        let config = AgentConfig::from(&self.settings);
        tracing::debug!(%id, notes_len = state.notes.len(), ?config, "invoking agent");

        let result = self.agent.run(state, &config).await.inspect_err(|e| {
            tracing::error!(%id, error = %e, "agent failed; record left RUNNING");
        })?;

        let summary = truncate_chars(&result.final_report, REPORT_SUMMARY_CHARS).to_string();
        let tokens = TokenUsage::new(result.input_tokens, result.output_tokens);
        let cost = estimate_cost(
            &self.settings.cost_model,
            result.input_tokens,
            result.output_tokens,
        );

        let update = ResearchUpdate::new()
            .status(ResearchStatus::Completed)
            .report(result.final_report)
            .summary(summary)
            .reasoning(RUN_REASONING)
            .sources(result.sources)
            .tokens(tokens)
            .cost(cost)
            .trace_id(result.trace_id);
        self.storage.update(&id, update).await?;

        tracing::info!(%id, %cost, "research run completed");
        Ok(id)
    }

    /// Run a continuation of `parent_id`, seeding it with the parent's summary.
    ///
    /// An unknown parent is tolerated: the run proceeds without a summary
    /// and keeps the dangling `parent_id`.
    pub async fn continue_from(
        &self,
        parent_id: &str,
        query: impl Into<String>,
        file_summary: Option<String>,
    ) -> Result<String, EngineError> {
        let parent_summary = self
            .storage
            .get(parent_id)
            .await?
            .and_then(|record| record.summary);
        if parent_summary.is_none() {
            tracing::warn!(parent_id, "continuing from a record with no stored summary");
        }

        let mut request = ResearchRequest::new(query).parent(parent_id, parent_summary);
        request.file_summary = file_summary;
        self.run(request).await
    }
}
