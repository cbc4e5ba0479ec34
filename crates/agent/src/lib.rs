//! Armory assembly and the auto-agent loop.
//!
//! Two strategy trees live here:
//!
//! 1. The **armory** ([`Armory`]) turns configuration rows into registered
//!    components: API client → chat model → MCP tool sets → chat client.
//! 2. The **auto-agent** ([`AutoAgent`]) drives an assembled client through
//!    bounded reasoning rounds, streaming [`AgentStreamEvent`]s:
//!    - submit the conversation to the client
//!    - if the model asks for tools, run them and append the results
//!    - otherwise stop with the model's answer
//!
//! [`AgentService`] bundles both for callers.

pub mod armory;
pub mod execute;
pub mod service;
pub mod sink;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use armory::{Armory, ArmoryCommand, ArmoryNode, ArmoryOutcome};
pub use execute::{AutoAgent, ExecuteCommand, ExecuteNode, ExecutionReport, StepRecord};
pub use service::AgentService;
pub use sink::StreamSink;
pub use stream_event::{AgentStreamEvent, ExecutionStatus};
