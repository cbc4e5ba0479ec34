//! Agent configuration records.
//!
//! These are the rows the armory reads from an [`AgentConfigStore`]:
//! an agent names its clients, a client names its model and MCP servers,
//! and a model names the API endpoint it talks to.
//!
//! [`AgentConfigStore`]: crate::store::AgentConfigStore

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An OpenAI-compatible endpoint and its credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_id: String,
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_completions_path")]
    pub completions_path: String,

    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: String,
}

fn default_completions_path() -> String {
    "v1/chat/completions".into()
}
fn default_embeddings_path() -> String {
    "v1/embeddings".into()
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_id", &self.api_id)
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "None" } else { "[REDACTED]" },
            )
            .field("completions_path", &self.completions_path)
            .field("embeddings_path", &self.embeddings_path)
            .finish()
    }
}

/// A chat model bound to one API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub api_id: String,
    pub model_name: String,

    #[serde(default = "crate::provider::default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// How to reach an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpTransport {
    Sse {
        base_uri: String,
        #[serde(default = "default_sse_endpoint")]
        sse_endpoint: String,
    },
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

fn default_sse_endpoint() -> String {
    "/sse".into()
}

/// An MCP server whose tools become one tool set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMcpConfig {
    pub mcp_id: String,
    pub name: String,
    pub transport: McpTransport,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    180
}

/// A chat client: model + tools + system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub model_id: String,

    #[serde(default)]
    pub tool_mcp_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// An agent as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_id: String,
    pub agent_name: String,

    #[serde(default)]
    pub description: String,

    /// Channel the agent is served on (e.g. "agent", "chat_stream").
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Clients in flow order. Only the first one drives the auto-agent
    /// loop and is assembled on demand; preheating a channel registers
    /// all of them.
    pub client_ids: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_channel() -> String {
    "agent".into()
}
fn default_enabled() -> bool {
    true
}
