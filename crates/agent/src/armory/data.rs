//! Configuration lists shared between the armory nodes.
//!
//! Each list is resolved once per run and cached in the [`DynamicContext`],
//! so every node downstream sees exactly the rows the first reader saw.

use super::{ArmoryCommand, Workshop};
use armory_core::agent::{ApiConfig, ClientConfig, ModelConfig, ToolMcpConfig};
use armory_core::context::{ContextKey, DynamicContext};
use armory_core::error::{Error, Result};
use armory_core::registry::{ComponentId, ComponentKind};
use std::collections::HashSet;
use tracing::debug;

pub const CLIENT_CONFIGS: ContextKey<Vec<ClientConfig>> = ContextKey::new("ai_client_list");
pub const MODEL_CONFIGS: ContextKey<Vec<ModelConfig>> = ContextKey::new("ai_client_model_list");
pub const API_CONFIGS: ContextKey<Vec<ApiConfig>> = ContextKey::new("ai_client_api_list");
pub const TOOL_MCP_CONFIGS: ContextKey<Vec<ToolMcpConfig>> =
    ContextKey::new("ai_client_tool_mcp_list");

/// Every component registered (or found registered) during the run, in order.
pub const REGISTERED: ContextKey<Vec<ComponentId>> = ContextKey::new("registered_components");

/// Order-preserving dedup.
fn unique(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Put `rows` in request order, failing on the first id the store lacks.
fn in_request_order<T: Clone>(
    kind: ComponentKind,
    ids: &[String],
    rows: Vec<T>,
    id_of: impl Fn(&T) -> &str,
) -> Result<Vec<T>> {
    ids.iter()
        .map(|id| {
            rows.iter()
                .find(|row| id_of(*row) == id)
                .cloned()
                .ok_or_else(|| Error::not_found(kind.data_name(), id.as_str()))
        })
        .collect()
}

impl Workshop {
    pub(crate) async fn clients(
        &self,
        command: &ArmoryCommand,
        ctx: &mut DynamicContext,
    ) -> Result<Vec<ClientConfig>> {
        let ids = match command.kind {
            ComponentKind::Client => unique(command.ids.iter().cloned()),
            _ => Vec::new(),
        };
        let store = &self.store;
        let rows = ctx
            .get_or_try_load(CLIENT_CONFIGS, move || async move {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                debug!(ids = ?ids, "Loading client configuration");
                let rows = store.clients(&ids).await?;
                in_request_order(ComponentKind::Client, &ids, rows, |c| c.client_id.as_str())
            })
            .await?;
        Ok(rows.clone())
    }

    pub(crate) async fn models(
        &self,
        command: &ArmoryCommand,
        ctx: &mut DynamicContext,
    ) -> Result<Vec<ModelConfig>> {
        let ids = match command.kind {
            ComponentKind::Model => unique(command.ids.iter().cloned()),
            ComponentKind::Client => unique(
                self.clients(command, ctx)
                    .await?
                    .into_iter()
                    .map(|c| c.model_id),
            ),
            _ => Vec::new(),
        };
        let store = &self.store;
        let rows = ctx
            .get_or_try_load(MODEL_CONFIGS, move || async move {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                debug!(ids = ?ids, "Loading model configuration");
                let rows = store.models(&ids).await?;
                in_request_order(ComponentKind::Model, &ids, rows, |m| m.model_id.as_str())
            })
            .await?;
        Ok(rows.clone())
    }

    pub(crate) async fn apis(
        &self,
        command: &ArmoryCommand,
        ctx: &mut DynamicContext,
    ) -> Result<Vec<ApiConfig>> {
        let ids = match command.kind {
            ComponentKind::Api => unique(command.ids.iter().cloned()),
            ComponentKind::Model | ComponentKind::Client => unique(
                self.models(command, ctx)
                    .await?
                    .into_iter()
                    .map(|m| m.api_id),
            ),
            ComponentKind::ToolMcp => Vec::new(),
        };
        let store = &self.store;
        let rows = ctx
            .get_or_try_load(API_CONFIGS, move || async move {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                debug!(ids = ?ids, "Loading API configuration");
                let rows = store.apis(&ids).await?;
                in_request_order(ComponentKind::Api, &ids, rows, |a| a.api_id.as_str())
            })
            .await?;
        Ok(rows.clone())
    }

    pub(crate) async fn tool_mcps(
        &self,
        command: &ArmoryCommand,
        ctx: &mut DynamicContext,
    ) -> Result<Vec<ToolMcpConfig>> {
        let ids = match command.kind {
            ComponentKind::ToolMcp => unique(command.ids.iter().cloned()),
            ComponentKind::Client => unique(
                self.clients(command, ctx)
                    .await?
                    .into_iter()
                    .flat_map(|c| c.tool_mcp_ids),
            ),
            _ => Vec::new(),
        };
        let store = &self.store;
        let rows = ctx
            .get_or_try_load(TOOL_MCP_CONFIGS, move || async move {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                debug!(ids = ?ids, "Loading MCP configuration");
                let rows = store.tool_mcps(&ids).await?;
                in_request_order(ComponentKind::ToolMcp, &ids, rows, |t| t.mcp_id.as_str())
            })
            .await?;
        Ok(rows.clone())
    }
}
