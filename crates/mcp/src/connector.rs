//! Opens MCP sessions over the transport a [`ToolMcpConfig`] names.

use crate::tool::{McpTool, Session};
use armory_core::agent::{McpTransport, ToolMcpConfig};
use armory_core::error::ToolError;
use armory_core::tool::{McpConnector, Tool};
use async_trait::async_trait;
use rmcp::ServiceExt;
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransport;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Connects MCP servers with rmcp.
///
/// Stdio servers are spawned as child processes. SSE rows are reached over
/// streamable HTTP at `base_uri` + `sse_endpoint`. The handshake, the tool
/// listing and every later tool call are bounded by the row's
/// `request_timeout_secs`.
///
/// The session stays open for as long as any of its tools is alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmcpConnector;

impl RmcpConnector {
    pub fn new() -> Self {
        Self
    }

    async fn open(config: &ToolMcpConfig) -> Result<Session, ToolError> {
        match &config.transport {
            McpTransport::Stdio { command, args, env } => {
                debug!(server = %config.name, command = %command, "Spawning MCP server");
                let mut cmd = Command::new(command);
                cmd.args(args).envs(env);
                let transport =
                    TokioChildProcess::new(cmd).map_err(|e| unavailable(config, e))?;
                ().serve(transport).await.map_err(|e| unavailable(config, e))
            }
            McpTransport::Sse {
                base_uri,
                sse_endpoint,
            } => {
                let url = endpoint_url(base_uri, sse_endpoint);
                debug!(server = %config.name, url = %url, "Connecting MCP server");
                let transport = StreamableHttpClientTransport::from_uri(url);
                ().serve(transport).await.map_err(|e| unavailable(config, e))
            }
        }
    }
}

#[async_trait]
impl McpConnector for RmcpConnector {
    async fn connect(&self, config: &ToolMcpConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        let session = within(config, "handshake", Self::open(config)).await?;
        let listed = within(config, "tool listing", async {
            session
                .list_all_tools()
                .await
                .map_err(|e| unavailable(config, e))
        })
        .await?;

        info!(
            mcp_id = %config.mcp_id,
            server = %config.name,
            tools = listed.len(),
            "MCP server connected"
        );

        let session = Arc::new(session);
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(listed
            .into_iter()
            .map(|tool| {
                Arc::new(McpTool::new(tool, session.clone(), &config.name, timeout)) as Arc<dyn Tool>
            })
            .collect())
    }
}

/// Lists no tools for any server.
///
/// Clients that reference MCP servers still assemble and run, just
/// without those servers' tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMcpConnector;

#[async_trait]
impl McpConnector for OfflineMcpConnector {
    async fn connect(&self, config: &ToolMcpConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        warn!(
            mcp_id = %config.mcp_id,
            server = %config.name,
            "MCP connections disabled, server contributes no tools"
        );
        Ok(Vec::new())
    }
}

fn endpoint_url(base_uri: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_uri.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn unavailable(config: &ToolMcpConfig, reason: impl std::fmt::Display) -> ToolError {
    ToolError::Unavailable {
        server: config.name.clone(),
        reason: reason.to_string(),
    }
}

async fn within<T>(
    config: &ToolMcpConfig,
    stage: &str,
    work: impl Future<Output = Result<T, ToolError>>,
) -> Result<T, ToolError> {
    let limit = Duration::from_secs(config.request_timeout_secs);
    tokio::time::timeout(limit, work).await.map_err(|_| {
        unavailable(
            config,
            format!("{stage} timed out after {}s", config.request_timeout_secs),
        )
    })?
}
