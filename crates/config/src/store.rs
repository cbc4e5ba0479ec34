//! `AgentConfigStore` over the tables of a loaded [`AppConfig`].

use crate::AppConfig;
use armory_core::agent::{AgentConfig, ApiConfig, ClientConfig, ModelConfig, ToolMcpConfig};
use armory_core::error::Result;
use armory_core::store::AgentConfigStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Read-only store serving the agent tables of a config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    agents: Vec<AgentConfig>,
    apis: HashMap<String, ApiConfig>,
    models: HashMap<String, ModelConfig>,
    tool_mcps: HashMap<String, ToolMcpConfig>,
    clients: HashMap<String, ClientConfig>,
}

impl ConfigStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            agents: config.agents.clone(),
            apis: index(&config.apis, |a| &a.api_id),
            models: index(&config.models, |m| &m.model_id),
            tool_mcps: index(&config.tool_mcps, |t| &t.mcp_id),
            clients: index(&config.clients, |c| &c.client_id),
        }
    }

    /// All agents, in file order.
    pub fn agents(&self) -> &[AgentConfig] {
        &self.agents
    }
}

fn index<T: Clone>(rows: &[T], key: impl Fn(&T) -> &String) -> HashMap<String, T> {
    rows.iter().map(|row| (key(row).clone(), row.clone())).collect()
}

/// Rows for `ids` in request order; unknown and repeated ids are skipped.
fn pick<T: Clone>(table: &HashMap<String, T>, ids: &[String]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id.as_str())
            && let Some(row) = table.get(id)
        {
            rows.push(row.clone());
        }
    }
    rows
}

#[async_trait]
impl AgentConfigStore for ConfigStore {
    async fn agent(&self, agent_id: &str) -> Result<Option<AgentConfig>> {
        Ok(self.agents.iter().find(|a| a.agent_id == agent_id).cloned())
    }

    async fn agents_by_channel(&self, channel: &str) -> Result<Vec<AgentConfig>> {
        let agents: Vec<AgentConfig> = self
            .agents
            .iter()
            .filter(|a| a.enabled && a.channel == channel)
            .cloned()
            .collect();
        debug!(channel, count = agents.len(), "Agents by channel");
        Ok(agents)
    }

    async fn apis(&self, api_ids: &[String]) -> Result<Vec<ApiConfig>> {
        Ok(pick(&self.apis, api_ids))
    }

    async fn models(&self, model_ids: &[String]) -> Result<Vec<ModelConfig>> {
        Ok(pick(&self.models, model_ids))
    }

    async fn tool_mcps(&self, mcp_ids: &[String]) -> Result<Vec<ToolMcpConfig>> {
        Ok(pick(&self.tool_mcps, mcp_ids))
    }

    async fn clients(&self, client_ids: &[String]) -> Result<Vec<ClientConfig>> {
        Ok(pick(&self.clients, client_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        let mut config = AppConfig::default();
        let mut second = config.clients[0].clone();
        second.client_id = "3002".into();
        config.clients.push(second);
        config.agents.push(AgentConfig {
            agent_id: "2".into(),
            agent_name: "disabled".into(),
            description: String::new(),
            channel: "agent".into(),
            client_ids: vec!["3002".into()],
            enabled: false,
        });
        ConfigStore::new(&config)
    }

    #[tokio::test]
    async fn clients_keep_request_order_and_skip_unknown() {
        let ids = vec!["3002".to_string(), "9999".to_string(), "3001".to_string(), "3002".to_string()];
        let clients = store().clients(&ids).await.unwrap();
        let got: Vec<&str> = clients.iter().map(|c| c.client_id.as_str()).collect();
        assert_eq!(got, vec!["3002", "3001"]);
    }

    #[tokio::test]
    async fn agents_by_channel_skips_disabled() {
        let agents = store().agents_by_channel("agent").await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].agent_id, "1");
        assert!(store().agents_by_channel("chat").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn agent_lookup() {
        let store = store();
        assert!(store.agent("1").await.unwrap().is_some());
        assert!(store.agent("404").await.unwrap().is_none());
    }
}
