//! Agent configuration store: where the armory reads its rows from.
//!
//! Lookups by id list return only the rows that exist, in request order;
//! callers decide whether a missing row is an error.

use crate::agent::{AgentConfig, ApiConfig, ClientConfig, ModelConfig, ToolMcpConfig};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AgentConfigStore: Send + Sync {
    async fn agent(&self, agent_id: &str) -> Result<Option<AgentConfig>>;

    async fn agents_by_channel(&self, channel: &str) -> Result<Vec<AgentConfig>>;

    async fn apis(&self, api_ids: &[String]) -> Result<Vec<ApiConfig>>;

    async fn models(&self, model_ids: &[String]) -> Result<Vec<ModelConfig>>;

    async fn tool_mcps(&self, mcp_ids: &[String]) -> Result<Vec<ToolMcpConfig>>;

    async fn clients(&self, client_ids: &[String]) -> Result<Vec<ClientConfig>>;
}
