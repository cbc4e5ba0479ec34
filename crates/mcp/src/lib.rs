//! MCP connectors for the tool stage of the armory.
//!
//! [`RmcpConnector`] opens a session with each configured server, lists its
//! tools and wraps them as [`armory_core::tool::Tool`]s that call back into
//! that session. [`OfflineMcpConnector`] connects nothing.

pub mod connector;
pub mod tool;

pub use connector::{OfflineMcpConnector, RmcpConnector};
pub use tool::McpTool;
