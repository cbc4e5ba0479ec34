//! Component registry: idempotent create-or-get of runtime components.
//!
//! Every component the armory builds (API client, chat model, tool set,
//! chat client) lives here under a typed [`ComponentId`]. Registration is
//! single-flight per id: concurrent callers for the same id wait for one
//! construction and all receive the same component. A failed construction
//! leaves the slot empty, so re-running the assembly retries it.

use crate::client::{ChatClient, ChatModel};
use crate::error::{ConstructionError, Error, Result};
use crate::provider::Provider;
use crate::tool::ToolSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// The four assembly stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Api,
    Model,
    ToolMcp,
    Client,
}

impl ComponentKind {
    /// Prefix of the registered component name, e.g. `ai_client_model_`.
    pub fn name_prefix(self) -> &'static str {
        match self {
            Self::Api => "ai_client_api_",
            Self::Model => "ai_client_model_",
            Self::ToolMcp => "ai_client_tool_mcp_",
            Self::Client => "ai_client_",
        }
    }

    /// Name of the configuration table backing this stage.
    pub fn data_name(self) -> &'static str {
        match self {
            Self::Api => "ai_client_api",
            Self::Model => "ai_client_model",
            Self::ToolMcp => "ai_client_tool_mcp",
            Self::Client => "ai_client",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Api => "api",
            Self::Model => "model",
            Self::ToolMcp => "tool_mcp",
            Self::Client => "client",
        })
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "model" => Ok(Self::Model),
            "tool_mcp" | "tool-mcp" | "mcp" | "tool" => Ok(Self::ToolMcp),
            "client" => Ok(Self::Client),
            other => Err(Error::config(format!("unknown component kind '{other}'"))),
        }
    }
}

/// Stable identifier of a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    pub kind: ComponentKind,
    pub id: String,
}

impl ComponentId {
    pub fn new(kind: ComponentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn api(id: impl Into<String>) -> Self {
        Self::new(ComponentKind::Api, id)
    }

    pub fn model(id: impl Into<String>) -> Self {
        Self::new(ComponentKind::Model, id)
    }

    pub fn tool_mcp(id: impl Into<String>) -> Self {
        Self::new(ComponentKind::ToolMcp, id)
    }

    pub fn client(id: impl Into<String>) -> Self {
        Self::new(ComponentKind::Client, id)
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.name_prefix(), self.id)
    }
}

/// A registered runtime component.
#[derive(Clone)]
pub enum Component {
    Api(Arc<dyn Provider>),
    Model(Arc<ChatModel>),
    ToolSet(Arc<ToolSet>),
    Client(Arc<ChatClient>),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Api(_) => ComponentKind::Api,
            Self::Model(_) => ComponentKind::Model,
            Self::ToolSet(_) => ComponentKind::ToolMcp,
            Self::Client(_) => ComponentKind::Client,
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(p) => f.debug_tuple("Api").field(&p.name()).finish(),
            Self::Model(m) => f.debug_tuple("Model").field(m).finish(),
            Self::ToolSet(t) => f.debug_tuple("ToolSet").field(t).finish(),
            Self::Client(c) => f.debug_tuple("Client").field(&c.client_id).finish(),
        }
    }
}

struct Registered {
    component: Component,
    fingerprint: String,
}

/// Process-wide store of assembled components, shared via `Arc`.
#[derive(Default)]
pub struct ComponentRegistry {
    slots: Mutex<HashMap<ComponentId, Arc<OnceCell<Registered>>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &ComponentId) -> Arc<OnceCell<Registered>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(id.clone()).or_default().clone()
    }

    /// Return the component registered under `id`, building it with
    /// `factory` if this is the first registration.
    ///
    /// `fingerprint` describes the parameters the component was built from.
    /// A later call with a different fingerprint is rejected with
    /// [`ConstructionError::Divergent`]; the stored component is kept.
    pub async fn register_or_get<F, Fut>(
        &self,
        id: &ComponentId,
        fingerprint: &str,
        factory: F,
    ) -> Result<Component>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Component>>,
    {
        let cell = self.slot(id);
        if cell.initialized() {
            debug!(component = %id, "Component already registered");
        }

        let registered = cell
            .get_or_try_init(|| async {
                let component = factory().await?;
                if component.kind() != id.kind {
                    return Err(Error::from(ConstructionError::KindMismatch {
                        component: id.to_string(),
                        actual: component.kind().to_string(),
                    }));
                }
                info!(component = %id, "Registered component");
                Ok(Registered {
                    component,
                    fingerprint: fingerprint.to_string(),
                })
            })
            .await?;

        if registered.fingerprint != fingerprint {
            warn!(component = %id, "Rejected re-registration with different parameters");
            return Err(ConstructionError::Divergent {
                component: id.to_string(),
            }
            .into());
        }

        Ok(registered.component.clone())
    }

    pub fn get(&self, id: &ComponentId) -> Option<Component> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(id)?.get().map(|r| r.component.clone())
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.get(id).is_some()
    }

    pub fn api(&self, api_id: &str) -> Option<Arc<dyn Provider>> {
        match self.get(&ComponentId::api(api_id))? {
            Component::Api(provider) => Some(provider),
            _ => None,
        }
    }

    pub fn model(&self, model_id: &str) -> Option<Arc<ChatModel>> {
        match self.get(&ComponentId::model(model_id))? {
            Component::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn tool_set(&self, mcp_id: &str) -> Option<Arc<ToolSet>> {
        match self.get(&ComponentId::tool_mcp(mcp_id))? {
            Component::ToolSet(tools) => Some(tools),
            _ => None,
        }
    }

    pub fn client(&self, client_id: &str) -> Option<Arc<ChatClient>> {
        match self.get(&ComponentId::client(client_id))? {
            Component::Client(client) => Some(client),
            _ => None,
        }
    }

    /// Ids of all successfully registered components, sorted.
    pub fn ids(&self) -> Vec<ComponentId> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<ComponentId> = slots
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
