//! # Armory Core
//!
//! Domain types, traits, and error definitions shared by the Armory crates.
//!
//! ## Design Philosophy
//!
//! The two pipelines (client assembly and auto-agent execution) are both
//! [`StrategyTree`]s: handler nodes that share a per-run context and route
//! to one another. Everything they consume from the outside world (agent
//! configuration, LLM endpoints, MCP servers) is a trait defined here, so
//! implementations can be swapped via configuration and stubbed in tests.

pub mod agent;
pub mod client;
pub mod context;
pub mod error;
pub mod message;
pub mod provider;
pub mod registry;
pub mod store;
pub mod tool;
pub mod tree;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, ApiConfig, ClientConfig, McpTransport, ModelConfig, ToolMcpConfig};
pub use client::{ChatClient, ChatModel};
pub use context::{ContextKey, DynamicContext};
pub use error::{ConstructionError, Error, ProviderError, Result, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role, SessionId};
pub use provider::{Provider, ProviderFactory, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use registry::{Component, ComponentId, ComponentKind, ComponentRegistry};
pub use store::AgentConfigStore;
pub use tool::{McpConnector, Tool, ToolCall, ToolResult, ToolSet};
pub use tree::{Route, StrategyHandler, StrategyTree};
