//! Configuration loading, validation, and management for Armory.
//!
//! Loads configuration from `~/.armory/config.toml` with environment
//! variable overrides. The same file carries the agent tables (`[[apis]]`,
//! `[[models]]`, `[[tool_mcps]]`, `[[clients]]`, `[[agents]]`) that
//! [`ConfigStore`] serves to the armory.

use armory_core::agent::{
    AgentConfig, ApiConfig, ClientConfig, ModelConfig, ToolMcpConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod store;

pub use store::ConfigStore;

/// The root configuration structure.
///
/// Maps directly to `~/.armory/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fallback API key for `[[apis]]` entries that leave theirs empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub apis: Vec<ApiConfig>,

    #[serde(default)]
    pub models: Vec<ModelConfig>,

    #[serde(default)]
    pub tool_mcps: Vec<ToolMcpConfig>,

    #[serde(default)]
    pub clients: Vec<ClientConfig>,

    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "api_key",
                &match self.api_key {
                    Some(_) => "[REDACTED]",
                    None => "None",
                },
            )
            .field("execution", &self.execution)
            .field("apis", &self.apis)
            .field("models", &self.models)
            .field("tool_mcps", &self.tool_mcps)
            .field("clients", &self.clients)
            .field("agents", &self.agents)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Step budget used when a run does not name one
    #[serde(default = "default_max_step")]
    pub default_max_step: u32,

    /// Capacity of the event channel handed to streaming callers
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// Channel whose agents are assembled at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preheat_channel: Option<String>,

    /// Health-check each API's model listing when it is first connected
    #[serde(default)]
    pub verify_apis: bool,

    /// Skip connecting MCP servers; clients assemble without their tools
    #[serde(default)]
    pub offline_mcp: bool,
}

fn default_max_step() -> u32 {
    3
}
fn default_stream_buffer() -> usize {
    128
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_max_step: default_max_step(),
            stream_buffer: default_stream_buffer(),
            preheat_channel: None,
            verify_apis: false,
            offline_mcp: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.armory/config.toml).
    ///
    /// Environment overrides:
    /// - `ARMORY_API_KEY`, then `OPENAI_API_KEY`: fallback API key
    /// - `ARMORY_MAX_STEP`: default step budget
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("ARMORY_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(max_step) = std::env::var("ARMORY_MAX_STEP") {
            config.execution.default_max_step = max_step.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ARMORY_MAX_STEP must be a positive integer, got '{max_step}'"
                ))
            })?;
        }

        config.apply_fallback_key();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".armory")
    }

    /// Fill empty per-API keys from the top-level key.
    fn apply_fallback_key(&mut self) {
        let Some(key) = &self.api_key else {
            return;
        };
        for api in self.apis.iter_mut().filter(|a| a.api_key.is_empty()) {
            api.api_key = key.clone();
        }
    }

    /// Validate the configuration, including references between tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.default_max_step == 0 {
            return Err(ConfigError::ValidationError(
                "execution.default_max_step must be at least 1".into(),
            ));
        }

        let api_ids = unique_ids("apis", self.apis.iter().map(|a| a.api_id.as_str()))?;
        let model_ids = unique_ids("models", self.models.iter().map(|m| m.model_id.as_str()))?;
        let mcp_ids = unique_ids("tool_mcps", self.tool_mcps.iter().map(|t| t.mcp_id.as_str()))?;
        let client_ids = unique_ids("clients", self.clients.iter().map(|c| c.client_id.as_str()))?;
        unique_ids("agents", self.agents.iter().map(|a| a.agent_id.as_str()))?;

        for model in &self.models {
            if !(0.0..=2.0).contains(&model.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "model '{}': temperature must be between 0.0 and 2.0",
                    model.model_id
                )));
            }
            require(&api_ids, &model.api_id, "model", &model.model_id, "api")?;
        }

        for client in &self.clients {
            require(&model_ids, &client.model_id, "client", &client.client_id, "model")?;
            for mcp_id in &client.tool_mcp_ids {
                require(&mcp_ids, mcp_id, "client", &client.client_id, "tool_mcp")?;
            }
        }

        for agent in &self.agents {
            if agent.client_ids.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "agent '{}' has no clients",
                    agent.agent_id
                )));
            }
            for client_id in &agent.client_ids {
                require(&client_ids, client_id, "agent", &agent.agent_id, "client")?;
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn unique_ids<'a>(
    table: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate id '{id}' in [[{table}]]"
            )));
        }
    }
    Ok(seen)
}

fn require(
    known: &HashSet<&str>,
    id: &str,
    owner_kind: &str,
    owner_id: &str,
    target_kind: &str,
) -> Result<(), ConfigError> {
    if known.contains(id) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{owner_kind} '{owner_id}' references unknown {target_kind} '{id}'"
        )))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            execution: ExecutionConfig::default(),
            apis: vec![ApiConfig {
                api_id: "1001".into(),
                base_url: "https://api.openai.com".into(),
                api_key: String::new(),
                completions_path: "v1/chat/completions".into(),
                embeddings_path: "v1/embeddings".into(),
            }],
            models: vec![ModelConfig {
                model_id: "2001".into(),
                api_id: "1001".into(),
                model_name: "gpt-4.1-mini".into(),
                temperature: 0.7,
                max_tokens: None,
            }],
            tool_mcps: vec![],
            clients: vec![ClientConfig {
                client_id: "3001".into(),
                model_id: "2001".into(),
                tool_mcp_ids: vec![],
                system_prompt: Some(
                    "You are a careful assistant. Use the available tools when they help, \
                     and answer directly once you have enough information."
                        .into(),
                ),
            }],
            agents: vec![AgentConfig {
                agent_id: "1".into(),
                agent_name: "default".into(),
                description: "Single-client auto agent".into(),
                channel: "agent".into(),
                client_ids: vec!["3001".into()],
                enabled: true,
            }],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
