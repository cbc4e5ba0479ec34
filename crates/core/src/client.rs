//! Chat model and chat client components.
//!
//! A [`ChatModel`] binds a connected provider to a model name and its
//! sampling options. A [`ChatClient`] adds the tools and system prompt and
//! is what the auto-agent loop talks to.

use crate::error::{ProviderError, ToolError};
use crate::message::{Conversation, Message, SessionId};
use crate::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use crate::tool::{ToolCall, ToolResult, ToolSet};
use std::sync::Arc;
use tracing::debug;

pub struct ChatModel {
    pub model_id: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    provider: Arc<dyn Provider>,
}

impl ChatModel {
    pub fn new(
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            model_name: model_name.into(),
            temperature: crate::provider::default_temperature(),
            max_tokens: None,
            provider,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model_name.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
        };
        self.provider.complete(request).await
    }
}

impl std::fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("model_id", &self.model_id)
            .field("model_name", &self.model_name)
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[derive(Debug)]
pub struct ChatClient {
    pub client_id: String,
    pub system_prompt: Option<String>,
    model: Arc<ChatModel>,
    tools: Arc<ToolSet>,
}

impl ChatClient {
    pub fn new(client_id: impl Into<String>, model: Arc<ChatModel>, tools: Arc<ToolSet>) -> Self {
        Self {
            client_id: client_id.into(),
            system_prompt: None,
            model,
            tools,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn model(&self) -> &Arc<ChatModel> {
        &self.model
    }

    pub fn tools(&self) -> &Arc<ToolSet> {
        &self.tools
    }

    /// Start a conversation for `task`, led by the system prompt if any.
    pub fn open(&self, session_id: SessionId, task: &str) -> Conversation {
        let mut conversation = Conversation::new(session_id);
        if let Some(prompt) = &self.system_prompt {
            conversation.push(Message::system(prompt));
        }
        conversation.push(Message::user(task));
        conversation
    }

    /// Submit the whole conversation with this client's tools attached.
    pub async fn call(&self, conversation: &Conversation) -> Result<ProviderResponse, ProviderError> {
        debug!(
            client = %self.client_id,
            messages = conversation.len(),
            tools = self.tools.len(),
            "Chat client call"
        );
        self.model
            .complete(conversation.messages.clone(), self.tools.definitions())
            .await
    }

    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        self.tools.execute(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CapturingProvider {
        seen: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for CapturingProvider {
        fn name(&self) -> &str {
            "capture"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant("ok"),
                usage: None,
                model: "capture-model".into(),
            })
        }
    }

    #[tokio::test]
    async fn call_uses_model_options() {
        let provider = Arc::new(CapturingProvider {
            seen: Mutex::new(Vec::new()),
        });
        let model = Arc::new(
            ChatModel::new("2001", "gpt-4.1-mini", provider.clone())
                .with_temperature(0.2)
                .with_max_tokens(Some(512)),
        );
        let client = ChatClient::new("3001", model, Arc::new(ToolSet::new()))
            .with_system_prompt(Some("You are a planner.".into()));

        let conversation = client.open(SessionId::from("s-1"), "plan my week");
        let response = client.call(&conversation).await.unwrap();
        assert_eq!(response.message.content, "ok");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4.1-mini");
        assert_eq!(seen[0].max_tokens, Some(512));
        assert!((seen[0].temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(seen[0].messages.len(), 2);
        assert_eq!(seen[0].messages[0].content, "You are a planner.");
    }

    #[test]
    fn open_without_system_prompt() {
        let provider = Arc::new(CapturingProvider {
            seen: Mutex::new(Vec::new()),
        });
        let model = Arc::new(ChatModel::new("2001", "m", provider));
        let client = ChatClient::new("3001", model, Arc::new(ToolSet::new()));
        let conversation = client.open(SessionId::new(), "task");
        assert_eq!(conversation.len(), 1);
    }
}
