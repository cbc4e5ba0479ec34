//! The four assembly nodes.

use super::data::REGISTERED;
use super::{ArmoryCommand, ArmoryNode, ArmoryOutcome, Workshop};
use armory_core::client::{ChatClient, ChatModel};
use armory_core::context::DynamicContext;
use armory_core::error::{ConstructionError, Error, Result};
use armory_core::registry::{Component, ComponentId};
use armory_core::tool::ToolSet;
use armory_core::tree::{Route, StrategyHandler};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

type ArmoryRoute = Route<ArmoryNode, ArmoryOutcome>;

fn failed(component: &ComponentId, reason: impl std::fmt::Display) -> ConstructionError {
    ConstructionError::Failed {
        component: component.to_string(),
        reason: reason.to_string(),
    }
}

/// Connects one API client per API row.
pub(crate) struct ApiNode(pub(crate) Arc<Workshop>);

#[async_trait]
impl StrategyHandler<ArmoryNode, ArmoryCommand, DynamicContext, ArmoryOutcome> for ApiNode {
    async fn apply(&self, command: &ArmoryCommand, ctx: &mut DynamicContext) -> Result<ArmoryRoute> {
        let apis = self.0.apis(command, ctx).await?;
        if apis.is_empty() {
            warn!("No API configuration to register, moving on");
            return Ok(Route::Next(ArmoryNode::Model));
        }

        for api in &apis {
            let id = ComponentId::api(&api.api_id);
            let providers = &self.0.providers;
            let build = async {
                let provider = providers.connect(api).await.map_err(|e| failed(&id, e))?;
                Ok::<_, Error>(Component::Api(provider))
            };
            self.0.register(ctx, id.clone(), api, build).await?;
        }

        Ok(Route::Next(ArmoryNode::Model))
    }
}

/// Binds each model row to its registered API client.
pub(crate) struct ModelNode(pub(crate) Arc<Workshop>);

#[async_trait]
impl StrategyHandler<ArmoryNode, ArmoryCommand, DynamicContext, ArmoryOutcome> for ModelNode {
    async fn apply(&self, command: &ArmoryCommand, ctx: &mut DynamicContext) -> Result<ArmoryRoute> {
        let models = self.0.models(command, ctx).await?;
        if models.is_empty() {
            warn!("No model configuration to register, moving on");
            return Ok(Route::Next(ArmoryNode::ToolMcp));
        }

        for model in &models {
            let id = ComponentId::model(&model.model_id);
            let registry = &self.0.registry;
            let build = async {
                let api = ComponentId::api(&model.api_id);
                let provider = registry
                    .api(&model.api_id)
                    .ok_or_else(|| Workshop::missing(&id, &api))?;
                let chat_model = ChatModel::new(&model.model_id, &model.model_name, provider)
                    .with_temperature(model.temperature)
                    .with_max_tokens(model.max_tokens);
                Ok::<_, Error>(Component::Model(Arc::new(chat_model)))
            };
            self.0.register(ctx, id.clone(), model, build).await?;
        }

        Ok(Route::Next(ArmoryNode::ToolMcp))
    }
}

/// Opens each MCP server and registers its tools as one set.
pub(crate) struct ToolMcpNode(pub(crate) Arc<Workshop>);

#[async_trait]
impl StrategyHandler<ArmoryNode, ArmoryCommand, DynamicContext, ArmoryOutcome> for ToolMcpNode {
    async fn apply(&self, command: &ArmoryCommand, ctx: &mut DynamicContext) -> Result<ArmoryRoute> {
        let mcps = self.0.tool_mcps(command, ctx).await?;
        if mcps.is_empty() {
            debug!("No MCP configuration to register, moving on");
            return Ok(Route::Next(ArmoryNode::Client));
        }

        for mcp in &mcps {
            let id = ComponentId::tool_mcp(&mcp.mcp_id);
            let connector = &self.0.connector;
            let build = async {
                let tools = connector.connect(mcp).await.map_err(|e| failed(&id, e))?;
                let set: ToolSet = tools.into_iter().collect();
                debug!(component = %id, tools = ?set.names(), "MCP tools listed");
                Ok::<_, Error>(Component::ToolSet(Arc::new(set)))
            };
            self.0.register(ctx, id.clone(), mcp, build).await?;
        }

        Ok(Route::Next(ArmoryNode::Client))
    }
}

/// Builds chat clients and ends the run.
pub(crate) struct ClientNode(pub(crate) Arc<Workshop>);

#[async_trait]
impl StrategyHandler<ArmoryNode, ArmoryCommand, DynamicContext, ArmoryOutcome> for ClientNode {
    async fn apply(&self, command: &ArmoryCommand, ctx: &mut DynamicContext) -> Result<ArmoryRoute> {
        let clients = self.0.clients(command, ctx).await?;
        if clients.is_empty() {
            debug!("No client configuration to register");
        }

        for client in &clients {
            let id = ComponentId::client(&client.client_id);
            let registry = &self.0.registry;
            let build = async {
                let model_id = ComponentId::model(&client.model_id);
                let model = registry
                    .model(&client.model_id)
                    .ok_or_else(|| Workshop::missing(&id, &model_id))?;

                let mut sets = Vec::with_capacity(client.tool_mcp_ids.len());
                for mcp_id in &client.tool_mcp_ids {
                    let set = registry
                        .tool_set(mcp_id)
                        .ok_or_else(|| Workshop::missing(&id, &ComponentId::tool_mcp(mcp_id)))?;
                    sets.push(set);
                }
                let tools = ToolSet::merged(sets.iter().map(Arc::as_ref));

                let chat_client = ChatClient::new(&client.client_id, model, Arc::new(tools))
                    .with_system_prompt(client.system_prompt.clone());
                Ok::<_, Error>(Component::Client(Arc::new(chat_client)))
            };
            self.0.register(ctx, id.clone(), client, build).await?;
        }

        let components = ctx
            .get(REGISTERED)
            .map(|ids| {
                ids.iter()
                    .filter(|id| id.kind == command.kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(Route::Done(ArmoryOutcome {
            kind: command.kind,
            components,
        }))
    }
}
