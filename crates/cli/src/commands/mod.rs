//! Subcommand implementations and the wiring they share.

pub mod agents;
pub mod assemble;
pub mod init;
pub mod preheat;
pub mod run;

use armory_agent::{AgentService, Armory};
use armory_config::{AppConfig, ConfigStore};
use armory_core::registry::ComponentRegistry;
use armory_core::tool::McpConnector;
use armory_mcp::{OfflineMcpConnector, RmcpConnector};
use armory_providers::OpenAiCompatFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// The config file to use: `--config` if given, else `~/.armory/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    AppConfig::load_with_overrides(&path)
        .map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the service over the config file's agent tables.
///
/// MCP servers are connected with rmcp unless `execution.offline_mcp` is
/// set; `execution.verify_apis` health-checks each API on first use.
pub fn build_service(config: &AppConfig) -> AgentService {
    debug!(
        offline_mcp = config.execution.offline_mcp,
        verify_apis = config.execution.verify_apis,
        "Wiring agent service"
    );
    let connector: Arc<dyn McpConnector> = if config.execution.offline_mcp {
        Arc::new(OfflineMcpConnector)
    } else {
        Arc::new(RmcpConnector::new())
    };
    let providers =
        OpenAiCompatFactory::new().with_health_check(config.execution.verify_apis);
    let armory = Armory::new(
        Arc::new(ConfigStore::new(config)),
        Arc::new(ComponentRegistry::new()),
        Arc::new(providers),
        connector,
    );
    AgentService::new(Arc::new(armory)).with_stream_buffer(config.execution.stream_buffer)
}
