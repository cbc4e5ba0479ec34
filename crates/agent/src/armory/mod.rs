//! The armory: assembles chat clients from their configuration rows.
//!
//! Assembly is a fixed four-node [`StrategyTree`]:
//!
//! ```text
//! API ──▶ Model ──▶ Tool/MCP ──▶ Client ──▶ ArmoryOutcome
//! ```
//!
//! Every node reads its configuration list through the run's
//! [`DynamicContext`], registers one component per row in the shared
//! [`ComponentRegistry`], and routes on. Which lists are non-empty follows
//! from the command kind: assembling a client also builds its model, that
//! model's API, and the client's MCP tool sets.

pub mod data;
mod nodes;

use armory_core::client::ChatClient;
use armory_core::context::DynamicContext;
use armory_core::error::{ConstructionError, Error, Result};
use armory_core::provider::ProviderFactory;
use armory_core::registry::{Component, ComponentId, ComponentKind, ComponentRegistry};
use armory_core::store::AgentConfigStore;
use armory_core::tool::McpConnector;
use armory_core::tree::StrategyTree;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use nodes::{ApiNode, ClientNode, ModelNode, ToolMcpNode};

/// Which stage to assemble and the ids to assemble it for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmoryCommand {
    pub kind: ComponentKind,
    pub ids: Vec<String>,
}

impl ArmoryCommand {
    pub fn new<I, S>(kind: ComponentKind, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmoryNode {
    Api,
    Model,
    ToolMcp,
    Client,
}

/// Result of an assembly run: the components of the requested stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmoryOutcome {
    pub kind: ComponentKind,
    pub components: Vec<ComponentId>,
}

/// Collaborators shared by every armory node.
pub(crate) struct Workshop {
    pub(crate) store: Arc<dyn AgentConfigStore>,
    pub(crate) registry: Arc<ComponentRegistry>,
    pub(crate) providers: Arc<dyn ProviderFactory>,
    pub(crate) connector: Arc<dyn McpConnector>,
}

impl Workshop {
    /// Register (or find) `id`, recording it in the run's context.
    ///
    /// `build` only runs when the registry has no component under `id`.
    pub(crate) async fn register<T, Fut>(
        &self,
        ctx: &mut DynamicContext,
        id: ComponentId,
        row: &T,
        build: Fut,
    ) -> Result<Component>
    where
        T: Serialize,
        Fut: Future<Output = Result<Component>>,
    {
        let fingerprint = serde_json::to_string(row)?;
        let component = self
            .registry
            .register_or_get(&id, &fingerprint, || build)
            .await?;
        ctx.entry_or_default(data::REGISTERED).push(id);
        Ok(component)
    }

    /// The registered component `dependency` needs, or `MissingDependency`.
    pub(crate) fn missing(component: &ComponentId, dependency: &ComponentId) -> Error {
        ConstructionError::MissingDependency {
            component: component.to_string(),
            dependency: dependency.to_string(),
        }
        .into()
    }
}

type ArmoryTree = StrategyTree<ArmoryNode, ArmoryCommand, DynamicContext, ArmoryOutcome>;

/// Client assembly entry point.
pub struct Armory {
    pub(crate) workshop: Arc<Workshop>,
    tree: ArmoryTree,
}

impl Armory {
    pub fn new(
        store: Arc<dyn AgentConfigStore>,
        registry: Arc<ComponentRegistry>,
        providers: Arc<dyn ProviderFactory>,
        connector: Arc<dyn McpConnector>,
    ) -> Self {
        let workshop = Arc::new(Workshop {
            store,
            registry,
            providers,
            connector,
        });
        let tree = StrategyTree::new(ArmoryNode::Api)
            .with_node(ArmoryNode::Api, ApiNode(workshop.clone()))
            .with_node(ArmoryNode::Model, ModelNode(workshop.clone()))
            .with_node(ArmoryNode::ToolMcp, ToolMcpNode(workshop.clone()))
            .with_node(ArmoryNode::Client, ClientNode(workshop.clone()));
        Self { workshop, tree }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.workshop.registry
    }

    pub fn store(&self) -> &Arc<dyn AgentConfigStore> {
        &self.workshop.store
    }

    /// Assemble with a fresh context.
    pub async fn assemble(&self, command: &ArmoryCommand) -> Result<ArmoryOutcome> {
        let mut ctx = DynamicContext::new();
        self.assemble_in(command, &mut ctx).await
    }

    /// Assemble using a caller-provided context, leaving the resolved lists
    /// and registered ids in it.
    pub async fn assemble_in(
        &self,
        command: &ArmoryCommand,
        ctx: &mut DynamicContext,
    ) -> Result<ArmoryOutcome> {
        if command.ids.is_empty() {
            warn!(kind = %command.kind, "Assembly command names no ids");
        }
        info!(kind = %command.kind, ids = ?command.ids, "Assembling components");
        let outcome = self.tree.apply(command, ctx).await?;
        info!(
            kind = %outcome.kind,
            components = outcome.components.len(),
            registry_size = self.registry().len(),
            "Assembly complete"
        );
        Ok(outcome)
    }

    /// The reasoning client of `agent_id`: its first configured client,
    /// assembled on demand. The agent's other clients are left to
    /// [`preheat`](Self::preheat).
    pub async fn ensure_agent_client(&self, agent_id: &str) -> Result<Arc<ChatClient>> {
        let agent = self
            .store()
            .agent(agent_id)
            .await?
            .ok_or_else(|| Error::not_found("ai_agent", agent_id))?;

        if !agent.enabled {
            return Err(Error::config(format!("agent '{agent_id}' is disabled")));
        }
        let Some(first) = agent.client_ids.first() else {
            return Err(Error::config(format!("agent '{agent_id}' has no clients")));
        };

        if !self.registry().contains(&ComponentId::client(first)) {
            self.assemble(&ArmoryCommand::new(ComponentKind::Client, [first.as_str()]))
                .await?;
        }

        self.registry().client(first).ok_or_else(|| {
            ConstructionError::MissingDependency {
                component: format!("ai_agent_{agent_id}"),
                dependency: ComponentId::client(first).to_string(),
            }
            .into()
        })
    }

    /// Assemble the clients of every enabled agent on `channel`.
    ///
    /// Returns the ids of the agents that were assembled.
    pub async fn preheat(&self, channel: &str) -> Result<Vec<String>> {
        let agents = self.store().agents_by_channel(channel).await?;
        let mut ready = Vec::with_capacity(agents.len());
        for agent in agents {
            if agent.client_ids.is_empty() {
                warn!(agent_id = %agent.agent_id, "Agent has no clients, skipping preheat");
                continue;
            }
            self.assemble(&ArmoryCommand::new(ComponentKind::Client, agent.client_ids))
                .await?;
            ready.push(agent.agent_id);
        }
        info!(channel, agents = ready.len(), "Preheat complete");
        Ok(ready)
    }
}
