//! Layered configuration loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`DELVE_*` prefix, `__` between sections)
//! 2. Project-level `./delve.toml`
//! 3. User-level `<config dir>/delve/config.toml`
//! 4. Built-in defaults
//!
//! `DELVE_AGENT__MODE=remote` maps to `agent.mode`, `DELVE_SERVER__PORT=9000`
//! to `server.port`, and so on.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "DELVE_";

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "delve.toml";

/// Default model for every agent stage.
pub const DEFAULT_AGENT_MODEL: &str = "openai:gpt-3.5-turbo";

/// Default model label used to price a run.
pub const DEFAULT_COST_MODEL: &str = "gpt-4";

/// Which agent implementation answers research requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Canned result, no network access.
    #[default]
    Mock,
    /// JSON over HTTP to an external research service.
    Remote,
}

/// Web search backend the agent may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchApi {
    #[default]
    None,
    Tavily,
    Openai,
    Anthropic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub mode: AgentMode,

    /// Research service URL, required in remote mode.
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token for the research service.
    #[serde(default)]
    pub api_key: String,

    /// Model label the run is priced against.
    #[serde(default = "default_cost_model")]
    pub cost_model: String,

    #[serde(default = "default_agent_model")]
    pub research_model: String,
    #[serde(default = "default_agent_model")]
    pub final_report_model: String,
    #[serde(default = "default_agent_model")]
    pub compression_model: String,
    #[serde(default = "default_agent_model")]
    pub summarization_model: String,

    #[serde(default)]
    pub search_api: SearchApi,

    #[serde(default = "default_max_researcher_iterations")]
    pub max_researcher_iterations: u32,
    #[serde(default = "default_max_concurrent_research_units")]
    pub max_concurrent_research_units: u32,
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,
}

fn default_agent_model() -> String {
    DEFAULT_AGENT_MODEL.to_string()
}

fn default_cost_model() -> String {
    DEFAULT_COST_MODEL.to_string()
}

const fn default_max_researcher_iterations() -> u32 {
    2
}

const fn default_max_concurrent_research_units() -> u32 {
    1
}

const fn default_recursion_limit() -> u32 {
    5
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            endpoint: String::new(),
            api_key: String::new(),
            cost_model: default_cost_model(),
            research_model: default_agent_model(),
            final_report_model: default_agent_model(),
            compression_model: default_agent_model(),
            summarization_model: default_agent_model(),
            search_api: SearchApi::default(),
            max_researcher_iterations: default_max_researcher_iterations(),
            max_concurrent_research_units: default_max_concurrent_research_units(),
            recursion_limit: default_recursion_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// When non-empty, every route except `/health` requires this key.
    #[serde(default)]
    pub api_key: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: String::new(),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelveConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl DelveConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; use [`DelveConfig::load_with_dotenv`] for that.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load `.env` from the current directory, then the layered config.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider chain, exposed so tests can layer their own sources.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("delve").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.mode == AgentMode::Remote && self.agent.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "agent.endpoint".to_string(),
                reason: "required when agent.mode = remote".to_string(),
            });
        }
        if self.agent.max_concurrent_research_units == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_concurrent_research_units".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Copy of this config with secrets replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        redact(&mut copy.agent.api_key);
        redact(&mut copy.server.api_key);
        copy
    }
}

fn redact(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "***".to_string();
    }
}
