//! Shared scripted collaborators for armory and execution tests.

use crate::armory::Armory;
use crate::stream_event::AgentStreamEvent;
use armory_core::agent::{
    AgentConfig, ApiConfig, ClientConfig, McpTransport, ModelConfig, ToolMcpConfig,
};
use armory_core::error::{ProviderError, Result, ToolError};
use armory_core::message::{Message, MessageToolCall};
use armory_core::provider::{Provider, ProviderFactory, ProviderRequest, ProviderResponse, Usage};
use armory_core::registry::ComponentRegistry;
use armory_core::store::AgentConfigStore;
use armory_core::tool::{McpConnector, Tool, ToolResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// --- Provider ---

/// A provider that answers from a script.
///
/// Each call takes the next scripted response; once the script is empty it
/// repeats the fallback response if there is one, and fails otherwise.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResponse>>,
    fallback: Option<ProviderResponse>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `response`.
    pub fn always(response: ProviderResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 500,
                message: "script exhausted".into(),
            })
    }
}

fn mock_usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

/// Create a response requesting `tool_calls`, with optional text.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ProviderResponse {
    let mut message = Message::assistant(text);
    message.tool_calls = tool_calls;
    ProviderResponse {
        message,
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

/// Hands out one shared provider and counts connections.
pub struct CountingFactory {
    provider: Arc<dyn Provider>,
    connects: AtomicUsize,
    failing: Mutex<HashSet<String>>,
}

impl CountingFactory {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_for(&self, api_id: &str) {
        self.failing.lock().unwrap().insert(api_id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProviderFactory for CountingFactory {
    async fn connect(&self, api: &ApiConfig) -> std::result::Result<Arc<dyn Provider>, ProviderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&api.api_id) {
            return Err(ProviderError::Network(format!("{} unreachable", api.base_url)));
        }
        Ok(self.provider.clone())
    }
}

// --- Tools ---

/// `search` succeeds and echoes its input; `explode` always fails hard.
struct RecordingTool {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Recording test tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }

    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.name == "explode" {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name.into(),
                reason: "index is read-only".into(),
            });
        }
        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: format!("{} ok: {arguments}", self.name),
        })
    }
}

/// Lists `search` and `explode` for every server and counts connections.
#[derive(Default)]
pub struct CountingConnector {
    connects: AtomicUsize,
    tool_calls: Arc<AtomicUsize>,
    failing: Mutex<HashSet<String>>,
}

impl CountingConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Tool executions across every tool this connector handed out.
    pub fn tool_calls(&self) -> usize {
        self.tool_calls.load(Ordering::SeqCst)
    }

    pub fn fail_for(&self, mcp_id: &str) {
        self.failing.lock().unwrap().insert(mcp_id.to_string());
    }
}

#[async_trait]
impl McpConnector for CountingConnector {
    async fn connect(&self, config: &ToolMcpConfig) -> std::result::Result<Vec<Arc<dyn Tool>>, ToolError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&config.mcp_id) {
            return Err(ToolError::Unavailable {
                server: config.name.clone(),
                reason: "connection refused".into(),
            });
        }
        Ok(["search", "explode"]
            .into_iter()
            .map(|name| {
                Arc::new(RecordingTool {
                    name,
                    calls: self.tool_calls.clone(),
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

// --- Store ---

/// In-memory store that counts lookups and returns rows in reverse
/// table order.
///
/// With `drift` set, every `clients` lookup after the first reports a
/// different model for the client, as a store being edited mid-run would.
#[derive(Default)]
pub struct MemoryStore {
    agents: Mutex<Vec<AgentConfig>>,
    apis: Mutex<Vec<ApiConfig>>,
    models: Mutex<Vec<ModelConfig>>,
    tool_mcps: Mutex<Vec<ToolMcpConfig>>,
    clients: Mutex<Vec<ClientConfig>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    drift: bool,
}

impl MemoryStore {
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn count(&self, method: &'static str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let n = calls.entry(method).or_default();
        *n += 1;
        *n
    }

    pub fn update_api(&self, api_id: &str, edit: impl FnOnce(&mut ApiConfig)) {
        let mut apis = self.apis.lock().unwrap();
        if let Some(api) = apis.iter_mut().find(|a| a.api_id == api_id) {
            edit(api);
        }
    }

    pub fn add_agent(&self, agent: AgentConfig) {
        self.agents.lock().unwrap().push(agent);
    }
}

fn pick<T: Clone>(rows: &Mutex<Vec<T>>, ids: &[String], id_of: impl Fn(&T) -> &str) -> Vec<T> {
    rows.lock()
        .unwrap()
        .iter()
        .rev()
        .filter(|row| ids.iter().any(|id| id == id_of(*row)))
        .cloned()
        .collect()
}

#[async_trait]
impl AgentConfigStore for MemoryStore {
    async fn agent(&self, agent_id: &str) -> Result<Option<AgentConfig>> {
        self.count("agent");
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.agent_id == agent_id)
            .cloned())
    }

    async fn agents_by_channel(&self, channel: &str) -> Result<Vec<AgentConfig>> {
        self.count("agents_by_channel");
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.enabled && a.channel == channel)
            .cloned()
            .collect())
    }

    async fn apis(&self, api_ids: &[String]) -> Result<Vec<ApiConfig>> {
        self.count("apis");
        Ok(pick(&self.apis, api_ids, |a| a.api_id.as_str()))
    }

    async fn models(&self, model_ids: &[String]) -> Result<Vec<ModelConfig>> {
        self.count("models");
        Ok(pick(&self.models, model_ids, |m| m.model_id.as_str()))
    }

    async fn tool_mcps(&self, mcp_ids: &[String]) -> Result<Vec<ToolMcpConfig>> {
        self.count("tool_mcps");
        Ok(pick(&self.tool_mcps, mcp_ids, |t| t.mcp_id.as_str()))
    }

    async fn clients(&self, client_ids: &[String]) -> Result<Vec<ClientConfig>> {
        let n = self.count("clients");
        let mut rows = pick(&self.clients, client_ids, |c| c.client_id.as_str());
        if self.drift && n > 1 {
            for row in &mut rows {
                row.model_id = "2002".into();
            }
        }
        Ok(rows)
    }
}

fn api(id: &str) -> ApiConfig {
    ApiConfig {
        api_id: id.into(),
        base_url: format!("http://localhost:1{id}"),
        api_key: "sk-test".into(),
        completions_path: "v1/chat/completions".into(),
        embeddings_path: "v1/embeddings".into(),
    }
}

fn model(id: &str, api_id: &str) -> ModelConfig {
    ModelConfig {
        model_id: id.into(),
        api_id: api_id.into(),
        model_name: "gpt-4.1-mini".into(),
        temperature: 0.2,
        max_tokens: None,
    }
}

/// APIs 1001-1003, models 2001 (on 1001) and 2002 (on 1002), MCP 5001,
/// client 3001 (model 2001, MCP 5001), and agent 1 driving client 3001.
fn fixture_store(drift: bool) -> MemoryStore {
    MemoryStore {
        agents: Mutex::new(vec![AgentConfig {
            agent_id: "1".into(),
            agent_name: "log analyst".into(),
            description: "Searches logs".into(),
            channel: "agent".into(),
            client_ids: vec!["3001".into()],
            enabled: true,
        }]),
        apis: Mutex::new(vec![api("1001"), api("1002"), api("1003")]),
        models: Mutex::new(vec![model("2001", "1001"), model("2002", "1002")]),
        tool_mcps: Mutex::new(vec![ToolMcpConfig {
            mcp_id: "5001".into(),
            name: "elasticsearch".into(),
            transport: McpTransport::Stdio {
                command: "npx".into(),
                args: vec!["-y".into(), "@elastic/mcp-server-elasticsearch".into()],
                env: BTreeMap::new(),
            },
            request_timeout_secs: 180,
        }]),
        clients: Mutex::new(vec![ClientConfig {
            client_id: "3001".into(),
            model_id: "2001".into(),
            tool_mcp_ids: vec!["5001".into()],
            system_prompt: Some("You are a log analyst.".into()),
        }]),
        calls: Mutex::new(HashMap::new()),
        drift,
    }
}

/// An armory wired to counting collaborators over the fixture store.
pub struct Rig {
    pub armory: Arc<Armory>,
    pub store: Arc<MemoryStore>,
    pub factory: Arc<CountingFactory>,
    pub connector: Arc<CountingConnector>,
}

impl Rig {
    pub fn new() -> Self {
        Self::build(Arc::new(ScriptedProvider::new(Vec::new())), false)
    }

    /// Clients served by `provider`.
    pub fn serving(provider: Arc<dyn Provider>) -> Self {
        Self::build(provider, false)
    }

    pub fn with_drifting_clients() -> Self {
        Self::build(Arc::new(ScriptedProvider::new(Vec::new())), true)
    }

    fn build(provider: Arc<dyn Provider>, drift: bool) -> Self {
        let store = Arc::new(fixture_store(drift));
        let factory = Arc::new(CountingFactory {
            provider,
            connects: AtomicUsize::new(0),
            failing: Mutex::new(HashSet::new()),
        });
        let connector = Arc::new(CountingConnector::default());
        let armory = Arc::new(Armory::new(
            store.clone(),
            Arc::new(ComponentRegistry::new()),
            factory.clone(),
            connector.clone(),
        ));
        Self {
            armory,
            store,
            factory,
            connector,
        }
    }
}

/// Collect every event until the channel closes.
pub async fn drain(mut rx: mpsc::Receiver<AgentStreamEvent>) -> Vec<AgentStreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
