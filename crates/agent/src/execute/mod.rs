//! Auto-agent execution: a bounded reasoning loop over an assembled client.
//!
//! The loop is a three-node [`StrategyTree`]:
//!
//! ```text
//! Prepare ──▶ Step ──▶ Finish
//!              ▲  │
//!              └──┘ (tool calls, budget left)
//! ```
//!
//! `Prepare` resolves the agent's client through the armory and opens the
//! conversation. Each `Step` is one round: submit the conversation, stream
//! what came back, run requested tools and feed their results back. The
//! loop ends when the model answers without tools, the step budget runs
//! out, or the receiver goes away; `Finish` reports the outcome.
//!
//! Failures never surface as a return value of [`AutoAgent::execute`];
//! they are reported as an `error` event on the sink.

mod nodes;

use crate::armory::Armory;
use crate::sink::StreamSink;
use crate::stream_event::{AgentStreamEvent, ExecutionStatus};
use armory_core::client::ChatClient;
use armory_core::context::{ContextKey, DynamicContext};
use armory_core::error::{Error, Result};
use armory_core::message::{Conversation, SessionId};
use armory_core::provider::Usage;
use armory_core::tool::ToolResult;
use armory_core::tree::StrategyTree;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use nodes::{FinishNode, PrepareNode, StepNode};

/// Default step budget, matching the shipped configuration.
pub const DEFAULT_MAX_STEP: u32 = 3;

/// A request to run an agent on one task.
#[derive(Debug, Clone)]
pub struct ExecuteCommand {
    pub agent_id: String,
    pub message: String,
    pub session_id: SessionId,
    /// Maximum number of rounds; must be at least 1.
    pub max_step: u32,
}

impl ExecuteCommand {
    pub fn new(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            message: message.into(),
            session_id: SessionId::new(),
            max_step: DEFAULT_MAX_STEP,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_max_step(mut self, max_step: u32) -> Self {
        self.max_step = max_step;
        self
    }
}

/// What happened in one round.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: u32,
    /// Messages submitted to the model this round.
    pub request_messages: usize,
    pub response: String,
    pub tool_results: Vec<ToolResult>,
    /// The round produced the final answer.
    pub completed: bool,
}

/// Final account of a run that did not fail.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub session_id: SessionId,
    pub status: ExecutionStatus,
    pub answer: String,
    pub steps: u32,
    pub tool_calls_made: usize,
    pub usage: Option<Usage>,
    pub history: Vec<StepRecord>,
}

impl ExecutionReport {
    pub fn done_event(&self) -> AgentStreamEvent {
        AgentStreamEvent::Done {
            session_id: self.session_id.to_string(),
            status: self.status,
            answer: self.answer.clone(),
            steps: self.steps,
            tool_calls_made: self.tool_calls_made,
            usage: self.usage,
        }
    }
}

/// Loop state carried between rounds.
pub(crate) struct LoopState {
    pub(crate) client: Arc<ChatClient>,
    pub(crate) conversation: Conversation,
    pub(crate) step: u32,
    pub(crate) status: Option<ExecutionStatus>,
    pub(crate) answer: String,
    pub(crate) usage: Option<Usage>,
    pub(crate) tool_calls_made: usize,
    pub(crate) history: Vec<StepRecord>,
}

impl LoopState {
    pub(crate) fn new(client: Arc<ChatClient>, conversation: Conversation) -> Self {
        Self {
            client,
            conversation,
            step: 0,
            status: None,
            answer: String::new(),
            usage: None,
            tool_calls_made: 0,
            history: Vec::new(),
        }
    }

    /// Stop the loop, falling back to the latest assistant text as the answer.
    pub(crate) fn finish(&mut self, status: ExecutionStatus) {
        if self.answer.is_empty() {
            self.answer = self
                .conversation
                .last_assistant_content()
                .unwrap_or_default()
                .to_string();
        }
        self.status = Some(status);
    }
}

pub(crate) const LOOP_STATE: ContextKey<LoopState> = ContextKey::new("auto_agent_loop");
pub(crate) const SINK: ContextKey<StreamSink> = ContextKey::new("stream_sink");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteNode {
    Prepare,
    Step,
    Finish,
}

type ExecuteTree = StrategyTree<ExecuteNode, ExecuteCommand, DynamicContext, ExecutionReport>;

/// Runs agents, streaming their progress to a [`StreamSink`].
pub struct AutoAgent {
    tree: ExecuteTree,
}

impl AutoAgent {
    pub fn new(armory: Arc<Armory>) -> Self {
        let tree = StrategyTree::new(ExecuteNode::Prepare)
            .with_node(ExecuteNode::Prepare, PrepareNode(armory))
            .with_node(ExecuteNode::Step, StepNode)
            .with_node(ExecuteNode::Finish, FinishNode);
        Self { tree }
    }

    /// Run to completion, returning the report or the failure.
    ///
    /// Progress events and the terminal `done` event go to `sink`; a
    /// failure is returned without being emitted.
    pub async fn run(&self, command: &ExecuteCommand, sink: &StreamSink) -> Result<ExecutionReport> {
        let mut ctx = DynamicContext::new();
        ctx.set(SINK, sink.clone());
        self.tree.apply(command, &mut ctx).await
    }

    /// Run and report every outcome, failures included, through `sink`.
    ///
    /// The sink is consumed: once this returns, the run holds no sender
    /// and the receiver sees the end of the stream after the terminal event.
    pub async fn execute(&self, command: &ExecuteCommand, sink: StreamSink) {
        info!(
            agent_id = %command.agent_id,
            session_id = %command.session_id,
            max_step = command.max_step,
            "Auto-agent run started"
        );
        match self.run(command, &sink).await {
            Ok(report) => info!(
                session_id = %report.session_id,
                status = %report.status,
                steps = report.steps,
                tool_calls = report.tool_calls_made,
                "Auto-agent run finished"
            ),
            Err(e) => {
                warn!(session_id = %command.session_id, error = %e, "Auto-agent run failed");
                sink.error(&e).await;
            }
        }
    }
}

pub(crate) fn sink_of(ctx: &DynamicContext) -> Result<StreamSink> {
    ctx.get(SINK)
        .cloned()
        .ok_or_else(|| Error::Internal("execution context has no sink".into()))
}

pub(crate) fn state_of(ctx: &mut DynamicContext) -> Result<&mut LoopState> {
    ctx.get_mut(LOOP_STATE)
        .ok_or_else(|| Error::Internal("execution context has no loop state".into()))
}
