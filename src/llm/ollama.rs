use crate::llm::client::{LLMClient, LLMResponse};
use crate::types::{AppError, ChatMessage, ChatRole, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage as OllamaMessage, MessageRole},
        tools::{ToolCall as OllamaToolCall, ToolCallFunction, ToolFunctionInfo, ToolInfo, ToolType},
    },
    Ollama,
};
use reqwest::Url;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_base_url(&base_url)?;
        Ok(Self {
            client: Ollama::new(host, port),
            model,
        })
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<LLMResponse> {
        let messages = messages.iter().map(convert_message).collect();
        let mut request = ChatMessageRequest::new(self.model.clone(), messages);
        if !tools.is_empty() {
            request = request.tools(
                tools
                    .iter()
                    .map(convert_tool)
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        debug!(model = %self.model, "Sending Ollama chat request");
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        // Ollama does not assign ids to tool calls
        let tool_calls: Vec<ToolCall> = response
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: format!("call_{}", Uuid::new_v4().simple()),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };

        Ok(LLMResponse {
            content: response.message.content,
            tool_calls,
            finish_reason: finish_reason.to_string(),
        })
    }
}

/// Scheme+host and port of an Ollama base URL such as `http://localhost:11434`.
fn split_base_url(base_url: &str) -> Result<(String, u16)> {
    let url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
        AppError::Configuration(format!("Invalid OLLAMA_URL '{}': {}", base_url, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        AppError::Configuration(format!("OLLAMA_URL '{}' has no host", base_url))
    })?;
    let port = url.port().unwrap_or(DEFAULT_OLLAMA_PORT);
    Ok((format!("{}://{}", url.scheme(), host), port))
}

fn convert_message(message: &ChatMessage) -> OllamaMessage {
    let role = match message.role {
        ChatRole::System => MessageRole::System,
        ChatRole::User => MessageRole::User,
        ChatRole::Assistant => MessageRole::Assistant,
        ChatRole::Tool => MessageRole::Tool,
    };
    let mut converted = OllamaMessage::new(role, message.content.clone());
    converted.tool_calls = message
        .tool_calls
        .iter()
        .map(|call| OllamaToolCall {
            function: ToolCallFunction {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        })
        .collect();
    converted
}

fn convert_tool(tool: &ToolDefinition) -> Result<ToolInfo> {
    let parameters: schemars::Schema = serde_json::from_value(tool.parameters.clone()).map_err(|e| {
        AppError::Tool(format!("Invalid parameter schema for '{}': {}", tool.name, e))
    })?;
    Ok(ToolInfo {
        tool_type: ToolType::Function,
        function: ToolFunctionInfo {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
        },
    })
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        Ok(self.chat(messages, &[]).await?.content)
    }

    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.chat(messages, tools).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
