//! Research agent backed by an external HTTP service.
//!
//! POSTs `{"state": ..., "config": ...}` as JSON and expects the
//! [`AgentResult`] mapping back. Uses `ureq` for HTTP, so every call runs on
//! `spawn_blocking`. There is no timeout: a slow service blocks the run.

use async_trait::async_trait;
use serde::Serialize;

use crate::agent::{Agent, AgentConfig, AgentError, AgentResult, AgentState};

#[derive(Serialize)]
struct RunRequest<'a> {
    state: &'a AgentState,
    config: &'a AgentConfig,
}

/// Agent that delegates to a remote research service.
pub struct HttpAgent {
    /// Full URL of the research endpoint.
    pub endpoint: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
}

impl HttpAgent {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Agent for HttpAgent {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self, state: AgentState, config: &AgentConfig) -> Result<AgentResult, AgentError> {
        let body = serde_json::to_value(RunRequest {
            state: &state,
            config,
        })
        .map_err(|e| AgentError::Parse(format!("failed to encode request: {}", e)))?;
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent
                .post(&endpoint)
                .header("content-type", "application/json");
            if let Some(key) = &api_key {
                request = request.header("authorization", &format!("Bearer {}", key));
            }

            match request.send_json(body) {
                Ok(resp) => resp
                    .into_body()
                    .read_json::<AgentResult>()
                    .map_err(|e| AgentError::Parse(e.to_string())),
                Err(ureq::Error::StatusCode(status)) => Err(AgentError::Api {
                    status,
                    message: format!("research service at {} rejected the run", endpoint),
                }),
                Err(e) => Err(AgentError::Network(e.to_string())),
            }
        })
        .await
        .map_err(|e| AgentError::Network(format!("task join error: {}", e)))?
    }
}
