//! Events streamed to the caller while an auto-agent run progresses.
//!
//! Serialized with a `type` tag so they can be forwarded as SSE frames
//! or printed as JSON lines:
//! - `step`: a reasoning round started
//! - `chunk`: text the model produced in a round
//! - `tool_call`: the agent is invoking a tool
//! - `tool_result`: tool execution completed
//! - `done`: the run finished; carries the final answer
//! - `error`: the run failed; nothing follows

use armory_core::provider::Usage;
use serde::{Deserialize, Serialize};

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The model answered without requesting tools.
    Completed,
    /// The step budget ran out; the answer is the best partial one.
    StepLimitReached,
    /// The caller stopped listening.
    Cancelled,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::StepLimitReached => "step_limit_reached",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Step { step: u32, max_step: u32 },

    Chunk { step: u32, content: String },

    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    Done {
        session_id: String,
        status: ExecutionStatus,
        answer: String,
        steps: u32,
        tool_calls_made: usize,
        usage: Option<Usage>,
    },

    Error { message: String },
}

impl AgentStreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serialization() {
        let json = serde_json::to_string(&AgentStreamEvent::Step { step: 2, max_step: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"step","step":2,"max_step":3}"#);
    }

    #[test]
    fn done_serialization() {
        let event = AgentStreamEvent::Done {
            session_id: "session-1".into(),
            status: ExecutionStatus::StepLimitReached,
            answer: "partial".into(),
            steps: 3,
            tool_calls_made: 2,
            usage: Some(Usage {
                prompt_tokens: 30,
                completion_tokens: 15,
                total_tokens: 45,
            }),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""status":"step_limit_reached""#));
        assert!(json.contains(r#""total_tokens":45"#));
        assert!(event.is_terminal());
    }

    #[test]
    fn tool_call_deserialization() {
        let json = r#"{"type":"tool_call","id":"call_1","name":"search","input":{"q":"logs"}}"#;
        match serde_json::from_str::<AgentStreamEvent>(json).unwrap() {
            AgentStreamEvent::ToolCall { name, input, .. } => {
                assert_eq!(name, "search");
                assert_eq!(input["q"], "logs");
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn event_type_names() {
        let events = [
            AgentStreamEvent::Step { step: 1, max_step: 1 },
            AgentStreamEvent::Chunk {
                step: 1,
                content: "x".into(),
            },
            AgentStreamEvent::ToolResult {
                id: "a".into(),
                name: "b".into(),
                output: "c".into(),
                success: false,
            },
            AgentStreamEvent::Error {
                message: "boom".into(),
            },
        ];
        let names: Vec<&str> = events.iter().map(AgentStreamEvent::event_type).collect();
        assert_eq!(names, vec!["step", "chunk", "tool_result", "error"]);
        assert!(!events[0].is_terminal());
        assert!(events[3].is_terminal());
    }
}
