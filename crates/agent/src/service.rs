//! `AgentService`: the entry point callers use.
//!
//! Owns the armory and the auto-agent loop and exposes assembly, preheat
//! and execution behind one handle that can be cloned into request
//! handlers or spawned tasks.

use crate::armory::{Armory, ArmoryCommand, ArmoryOutcome};
use crate::execute::{AutoAgent, ExecuteCommand};
use crate::sink::StreamSink;
use crate::stream_event::AgentStreamEvent;
use armory_core::client::ChatClient;
use armory_core::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

const DEFAULT_STREAM_BUFFER: usize = 128;

#[derive(Clone)]
pub struct AgentService {
    armory: Arc<Armory>,
    agent: Arc<AutoAgent>,
    stream_buffer: usize,
}

impl AgentService {
    pub fn new(armory: Arc<Armory>) -> Self {
        Self {
            agent: Arc::new(AutoAgent::new(armory.clone())),
            armory,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Capacity of the channel returned by [`execute_stream`](Self::execute_stream).
    pub fn with_stream_buffer(mut self, buffer: usize) -> Self {
        self.stream_buffer = buffer.max(1);
        self
    }

    pub fn armory(&self) -> &Arc<Armory> {
        &self.armory
    }

    pub async fn assemble(&self, command: &ArmoryCommand) -> Result<ArmoryOutcome> {
        self.armory.assemble(command).await
    }

    pub async fn preheat(&self, channel: &str) -> Result<Vec<String>> {
        self.armory.preheat(channel).await
    }

    pub async fn ensure_agent_client(&self, agent_id: &str) -> Result<Arc<ChatClient>> {
        self.armory.ensure_agent_client(agent_id).await
    }

    /// Run `command`, reporting progress and outcome only through `sink`.
    pub async fn execute(&self, command: ExecuteCommand, sink: StreamSink) {
        self.agent.execute(&command, sink).await;
    }

    /// Spawn a run and hand back the receiving end of its event stream.
    ///
    /// Dropping the receiver cancels the run before its next round or
    /// tool call.
    pub fn execute_stream(&self, command: ExecuteCommand) -> mpsc::Receiver<AgentStreamEvent> {
        let (sink, rx) = StreamSink::channel(self.stream_buffer);
        let agent = self.agent.clone();
        tokio::spawn(async move {
            agent.execute(&command, sink).await;
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_event::ExecutionStatus;
    use crate::test_helpers::{Rig, ScriptedProvider, make_text_response, make_tool_call, make_tool_call_response};
    use armory_core::registry::{ComponentId, ComponentKind};

    #[tokio::test]
    async fn execute_stream_delivers_events_then_closes() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            make_tool_call_response(
                vec![make_tool_call("search", serde_json::json!({"q": "timeout"}))],
                "Checking the index",
            ),
            make_text_response("Three timeouts since midnight."),
        ]));
        let rig = Rig::serving(provider);
        let service = AgentService::new(rig.armory.clone()).with_stream_buffer(4);

        let mut rx = service.execute_stream(ExecuteCommand::new("1", "any timeouts?").with_session("s-42"));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        match events.last() {
            Some(AgentStreamEvent::Done {
                session_id,
                status,
                answer,
                steps,
                tool_calls_made,
                ..
            }) => {
                assert_eq!(session_id, "s-42");
                assert_eq!(*status, ExecutionStatus::Completed);
                assert_eq!(answer, "Three timeouts since midnight.");
                assert_eq!(*steps, 2);
                assert_eq!(*tool_calls_made, 1);
            }
            other => panic!("Expected done, got {other:?}"),
        }
        assert_eq!(events.iter().filter(|e| e.event_type() == "chunk").count(), 2);
    }

    #[tokio::test]
    async fn execute_reports_failure_through_sink() {
        let rig = Rig::new();
        let service = AgentService::new(rig.armory.clone());
        let (sink, mut rx) = StreamSink::channel(8);

        service
            .execute(ExecuteCommand::new("missing", "task"), sink)
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "error");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn assemble_and_preheat_share_the_registry() {
        let rig = Rig::new();
        let service = AgentService::new(rig.armory.clone());

        service
            .assemble(&ArmoryCommand::new(ComponentKind::Api, ["1001"]))
            .await
            .unwrap();
        service.preheat("agent").await.unwrap();

        assert!(rig.armory.registry().contains(&ComponentId::client("3001")));
        assert_eq!(rig.factory.connects(), 1);

        let client = service.ensure_agent_client("1").await.unwrap();
        assert_eq!(client.client_id, "3001");
    }
}
