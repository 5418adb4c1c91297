//! delve-engine: orchestrates research runs.
//!
//! The [`Agent`] trait is the single point where research happens. The
//! engine only assembles the request, prices the answer, and records it.
//! Which agent runs is a configuration choice (`agent.mode`), not a
//! compile-time switch; the HTTP-backed agent needs the `remote` feature.

mod agent;
mod engine;
mod error;
#[cfg(feature = "remote")]
mod http;
mod mock;

pub use agent::{
    Agent, AgentConfig, AgentError, AgentResult, AgentState, Configurable, Message,
};
pub use engine::{
    agent_from_settings, ResearchEngine, ResearchRequest, REPORT_SUMMARY_CHARS, RUN_REASONING,
};
pub use error::EngineError;
#[cfg(feature = "remote")]
pub use http::HttpAgent;
pub use mock::{
    MockAgent, MOCK_INPUT_TOKENS, MOCK_OUTPUT_TOKENS, MOCK_REPORT, MOCK_SOURCES, MOCK_TRACE_ID,
};
