//! Prepare, Step and Finish nodes of the auto-agent loop.

use super::{
    ExecuteCommand, ExecuteNode, ExecutionReport, LOOP_STATE, LoopState, StepRecord, sink_of,
    state_of,
};
use crate::armory::Armory;
use crate::stream_event::{AgentStreamEvent, ExecutionStatus};
use armory_core::context::DynamicContext;
use armory_core::error::{Error, Result, ToolError};
use armory_core::message::{Message, MessageToolCall};
use armory_core::provider::Usage;
use armory_core::tool::{ToolCall, ToolResult};
use armory_core::tree::{Route, StrategyHandler};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

type ExecuteRoute = Route<ExecuteNode, ExecutionReport>;

/// Resolves the agent's client and opens the conversation.
pub(crate) struct PrepareNode(pub(crate) Arc<Armory>);

#[async_trait]
impl StrategyHandler<ExecuteNode, ExecuteCommand, DynamicContext, ExecutionReport> for PrepareNode {
    async fn apply(&self, command: &ExecuteCommand, ctx: &mut DynamicContext) -> Result<ExecuteRoute> {
        if command.max_step == 0 {
            return Err(Error::config("max_step must be at least 1"));
        }

        let client = self.0.ensure_agent_client(&command.agent_id).await?;
        let conversation = client.open(command.session_id.clone(), &command.message);
        debug!(
            session_id = %command.session_id,
            client = %client.client_id,
            tools = client.tools().len(),
            "Conversation opened"
        );

        ctx.set(LOOP_STATE, LoopState::new(client, conversation));
        Ok(Route::Next(ExecuteNode::Step))
    }
}

fn parse_arguments(call: &MessageToolCall) -> std::result::Result<serde_json::Value, ToolError> {
    if call.arguments.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(&call.arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{}: {e}", call.name)))
}

/// One reasoning round.
pub(crate) struct StepNode;

#[async_trait]
impl StrategyHandler<ExecuteNode, ExecuteCommand, DynamicContext, ExecutionReport> for StepNode {
    async fn apply(&self, command: &ExecuteCommand, ctx: &mut DynamicContext) -> Result<ExecuteRoute> {
        let sink = sink_of(ctx)?;
        let state = state_of(ctx)?;

        if state.step >= command.max_step {
            warn!(
                session_id = %command.session_id,
                max_step = command.max_step,
                "Step budget exhausted"
            );
            state.finish(ExecutionStatus::StepLimitReached);
            return Ok(Route::Next(ExecuteNode::Finish));
        }
        if sink.is_closed() {
            info!(session_id = %command.session_id, "Receiver closed, stopping before next round");
            state.finish(ExecutionStatus::Cancelled);
            return Ok(Route::Next(ExecuteNode::Finish));
        }

        state.step += 1;
        let step = state.step;
        sink.emit(AgentStreamEvent::Step {
            step,
            max_step: command.max_step,
        })
        .await;
        debug!(session_id = %command.session_id, step, "Agent loop round");

        let request_messages = state.conversation.len();
        let response = state.client.call(&state.conversation).await?;
        if let Some(usage) = &response.usage {
            state.usage.get_or_insert_with(Usage::default).add(usage);
        }

        let message = response.message;
        if !message.content.is_empty() {
            sink.emit(AgentStreamEvent::Chunk {
                step,
                content: message.content.clone(),
            })
            .await;
        }

        let mut record = StepRecord {
            step,
            request_messages,
            response: message.content.clone(),
            tool_results: Vec::new(),
            completed: false,
        };

        if !message.requests_tools() {
            record.completed = true;
            state.answer = message.content.clone();
            state.conversation.push(message);
            state.history.push(record);
            state.finish(ExecutionStatus::Completed);
            return Ok(Route::Next(ExecuteNode::Finish));
        }

        let calls = message.tool_calls.clone();
        state.conversation.push(message);

        for tc in &calls {
            if sink.is_closed() {
                info!(session_id = %command.session_id, tool = %tc.name, "Receiver closed, skipping tool call");
                state.history.push(record);
                state.finish(ExecutionStatus::Cancelled);
                return Ok(Route::Next(ExecuteNode::Finish));
            }

            let outcome = match parse_arguments(tc) {
                Ok(arguments) => {
                    sink.emit(AgentStreamEvent::ToolCall {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        input: arguments.clone(),
                    })
                    .await;
                    let call = ToolCall {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        arguments,
                    };
                    state.client.invoke(&call).await
                }
                Err(e) => Err(e),
            };
            state.tool_calls_made += 1;

            let result = match outcome {
                Ok(result) => result,
                Err(e) if e.is_recoverable() => {
                    warn!(tool = %tc.name, error = %e, "Tool call rejected, reporting to model");
                    ToolResult {
                        call_id: tc.id.clone(),
                        success: false,
                        output: format!("Error: {e}"),
                    }
                }
                Err(e) => return Err(e.into()),
            };

            sink.emit(AgentStreamEvent::ToolResult {
                id: tc.id.clone(),
                name: tc.name.clone(),
                output: result.output.clone(),
                success: result.success,
            })
            .await;
            state
                .conversation
                .push(Message::tool_result(&tc.id, &result.output));
            record.tool_results.push(result);
        }

        state.history.push(record);
        Ok(Route::Next(ExecuteNode::Step))
    }
}

/// Emits the terminal event and returns the report.
pub(crate) struct FinishNode;

#[async_trait]
impl StrategyHandler<ExecuteNode, ExecuteCommand, DynamicContext, ExecutionReport> for FinishNode {
    async fn apply(&self, command: &ExecuteCommand, ctx: &mut DynamicContext) -> Result<ExecuteRoute> {
        let sink = sink_of(ctx)?;
        let state = state_of(ctx)?;
        let status = state
            .status
            .ok_or_else(|| Error::Internal("loop finished without a status".into()))?;

        let report = ExecutionReport {
            session_id: command.session_id.clone(),
            status,
            answer: state.answer.clone(),
            steps: state.step,
            tool_calls_made: state.tool_calls_made,
            usage: state.usage,
            history: std::mem::take(&mut state.history),
        };

        if status != ExecutionStatus::Cancelled {
            sink.complete(&report).await;
        }
        Ok(Route::Done(report))
    }
}
