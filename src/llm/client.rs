//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the chat providers crews run on:
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint, with tool calling
//! - **Ollama**: local inference through `/api/chat`, with tool calling

use crate::types::{AppError, ChatMessage, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate with conversation history
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Generate with tool calling support
    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

impl LLMResponse {
    /// Whether the model asked for at least one tool call
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    ///
    /// Tool calling needs a model that supports it (e.g. `llama3.1`, `qwen2.5`).
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration is unusable.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => {
                if api_key.is_empty() {
                    return Err(AppError::Configuration(
                        "OPENAI_API_KEY is not set; cannot create an OpenAI client".to_string(),
                    ));
                }
                Ok(Box::new(super::openai::OpenAIClient::new(
                    api_key.clone(),
                    api_base.clone(),
                    model.clone(),
                )))
            }

            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone())?,
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model identifier this provider is configured with
    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Abstraction over client construction so handlers can run against any backend.
#[async_trait]
pub trait LLMClientFactoryTrait: Send + Sync {
    /// The provider used when none is specified
    fn default_provider(&self) -> &Provider;

    /// Create a client using the default provider
    async fn create_default(&self) -> Result<Box<dyn LLMClient>>;
}

/// Configuration-based client factory
///
/// # Example
///
/// ```rust,ignore
/// use crew_memory::llm::{LLMClientFactory, Provider};
///
/// let factory = LLMClientFactory::new(Provider::Ollama {
///     base_url: "http://localhost:11434".to_string(),
///     model: "llama3.2".to_string(),
/// });
///
/// let client = factory.create_default().await?;
/// ```
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for LLMClientFactory {
    fn default_provider(&self) -> &Provider {
        &self.default_provider
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }
}
