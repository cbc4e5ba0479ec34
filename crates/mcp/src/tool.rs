//! A tool discovered on an MCP server.

use armory_core::error::ToolError;
use armory_core::tool::{Tool, ToolResult};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, Content, RawContent};
use rmcp::service::{RoleClient, RunningService};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) type Session = RunningService<RoleClient, ()>;

/// Calls one remote tool over the session it was listed on.
pub struct McpTool {
    name: String,
    description: String,
    schema: serde_json::Value,
    server: String,
    timeout: Duration,
    session: Arc<Session>,
}

impl McpTool {
    pub(crate) fn new(
        tool: rmcp::model::Tool,
        session: Arc<Session>,
        server: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.as_deref().unwrap_or_default().to_string(),
            schema: serde_json::Value::Object((*tool.input_schema).clone()),
            server: server.to_string(),
            timeout,
            session,
        }
    }

    /// The MCP server this tool was listed on.
    pub fn server(&self) -> &str {
        &self.server
    }

    fn failed(&self, reason: impl std::fmt::Display) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let arguments = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "{} expects an object, got {other}",
                    self.name
                )));
            }
        };

        debug!(server = %self.server, tool = %self.name, "Calling MCP tool");
        let params = CallToolRequestParams {
            meta: None,
            name: self.name.clone().into(),
            arguments,
            task: None,
        };
        let result = tokio::time::timeout(self.timeout, self.session.call_tool(params))
            .await
            .map_err(|_| self.failed(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| self.failed(e))?;

        Ok(into_tool_result(result))
    }
}

/// Text blocks joined by newlines; structured content when there is no text.
///
/// A result the server flags as an error is returned unsuccessful so the
/// model sees it.
pub(crate) fn into_tool_result(result: CallToolResult) -> ToolResult {
    let mut output = text_of(&result.content);
    if output.is_empty()
        && let Some(structured) = &result.structured_content
    {
        output = structured.to_string();
    }
    ToolResult {
        call_id: String::new(),
        success: result.is_error != Some(true),
        output,
    }
}

fn text_of(content: &[Content]) -> String {
    content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_are_joined() {
        let result = CallToolResult::success(vec![
            Content::text("app-logs-2025.06.01"),
            Content::text("app-logs-2025.06.02"),
        ]);
        let converted = into_tool_result(result);
        assert!(converted.success);
        assert_eq!(converted.output, "app-logs-2025.06.01\napp-logs-2025.06.02");
    }

    #[test]
    fn server_side_error_is_unsuccessful() {
        let result = CallToolResult::error(vec![Content::text("index_not_found_exception")]);
        let converted = into_tool_result(result);
        assert!(!converted.success);
        assert_eq!(converted.output, "index_not_found_exception");
    }

    #[test]
    fn tool_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<McpTool>();
    }
}
