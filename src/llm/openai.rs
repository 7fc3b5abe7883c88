use crate::llm::client::{LLMClient, LLMResponse};
use crate::types::{AppError, ChatMessage, ChatRole, Result, ToolCall, ToolDefinition};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequest,
        FunctionCall, FunctionObject, ToolChoiceOptions,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base.trim_end_matches('/'));

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<CreateChatCompletionRequest> {
        let messages = messages
            .iter()
            .map(convert_message)
            .collect::<Result<Vec<_>>>()?;

        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(tools.iter().map(convert_tool).collect()),
                Some(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto)),
            )
        };

        Ok(CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            tools,
            tool_choice,
            ..Default::default()
        })
    }

    async fn complete(&self, request: CreateChatCompletionRequest) -> Result<LLMResponse> {
        debug!(model = %self.model, "Sending chat completion request");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|call| match call {
                ChatCompletionMessageToolCalls::Function(call) => Some(ToolCall {
                    arguments: parse_arguments(&call.function.name, &call.function.arguments),
                    id: call.id,
                    name: call.function.name,
                }),
                _ => None,
            })
            .collect();

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason: choice
                .finish_reason
                .map(|r| format!("{:?}", r))
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

/// Decode the JSON-encoded arguments of a tool call.
///
/// Undecodable text is kept as a JSON string so the tool call is rejected
/// with a visible error instead of running with empty arguments.
fn parse_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(tool = %tool, "Model sent undecodable tool arguments: {}", e);
            Value::String(raw.to_string())
        }
    }
}

fn convert_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let converted = match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(message.content.clone()),
            name: None,
        }
        .into(),
        ChatRole::User => ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(message.content.clone()),
            name: None,
        }
        .into(),
        ChatRole::Assistant => {
            let content = (!message.content.is_empty()).then(|| {
                ChatCompletionRequestAssistantMessageContent::Text(message.content.clone())
            });
            let tool_calls = (!message.tool_calls.is_empty()).then(|| {
                message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                    })
                    .collect()
            });

            #[allow(deprecated)]
            ChatCompletionRequestAssistantMessage {
                content,
                name: None,
                tool_calls,
                function_call: None,
                refusal: None,
                audio: None,
            }
            .into()
        }
        ChatRole::Tool => {
            let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                AppError::Internal("Tool message is missing its tool_call_id".to_string())
            })?;
            ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(message.content.clone()),
                tool_call_id,
            }
            .into()
        }
    };
    Ok(converted)
}

fn convert_tool(tool: &ToolDefinition) -> ChatCompletionTools {
    ChatCompletionTools::Function(ChatCompletionTool {
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    })
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = self.complete(self.build_request(messages, &[])?).await?;
        Ok(response.content)
    }

    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.complete(self.build_request(messages, tools)?).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
