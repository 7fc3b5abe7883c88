use super::{interpolate, CrewInputs};
use crate::llm::LLMClient;
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, Result, ToolCall};
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Model round-trips an agent may spend on tool calls before it must answer.
pub const DEFAULT_MAX_ITER: usize = 20;

/// Time allowed for a single tool call.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(60);

const FINAL_ANSWER_PROMPT: &str = "You have reached the maximum number of tool calls for this task. \
Do not call any more tools. Give your best final answer now, based on what you have gathered.";

/// Static definition of a crew member.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Identifier tasks use to refer to this agent.
    pub key: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Names of registry tools this agent may call.
    pub tools: Vec<String>,
    pub max_iter: usize,
}

impl AgentSpec {
    pub fn new(
        key: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// An [`AgentSpec`] bound to one run's inputs.
pub struct CrewAgent<'a> {
    spec: &'a AgentSpec,
    system_prompt: String,
}

impl<'a> CrewAgent<'a> {
    pub fn new(spec: &'a AgentSpec, inputs: &CrewInputs) -> Self {
        let system_prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            interpolate(&spec.role, inputs),
            interpolate(&spec.backstory, inputs),
            interpolate(&spec.goal, inputs),
        );
        Self {
            spec,
            system_prompt,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Work on `prompt` until the model answers without requesting tools.
    pub async fn run(
        &self,
        prompt: &str,
        llm: &dyn LLMClient,
        tools: &ToolRegistry,
    ) -> Result<String> {
        let allowed: Vec<&str> = self.spec.tools.iter().map(String::as_str).collect();
        let definitions = tools.get_tool_definitions_for(&allowed);

        let mut messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];

        if definitions.is_empty() {
            return llm.generate_with_history(&messages).await;
        }

        for iteration in 0..self.spec.max_iter {
            let response = llm.generate_with_tools(&messages, &definitions).await?;

            if !response.wants_tools() {
                debug!(agent = %self.spec.key, iterations = iteration + 1, "Agent finished");
                return Ok(response.content);
            }

            messages.push(ChatMessage::assistant_tool_calls(
                response.content.as_str(),
                response.tool_calls.clone(),
            ));

            let results = join_all(
                response
                    .tool_calls
                    .iter()
                    .map(|call| self.call_tool(call, tools)),
            )
            .await;

            for (call, result) in response.tool_calls.iter().zip(results) {
                messages.push(ChatMessage::tool(call.id.as_str(), result));
            }
        }

        warn!(
            agent = %self.spec.key,
            max_iter = self.spec.max_iter,
            "Agent hit its iteration limit, requesting final answer"
        );
        messages.push(ChatMessage::user(FINAL_ANSWER_PROMPT));
        llm.generate_with_history(&messages).await
    }

    /// Run one tool call. Failures are reported back to the model as JSON.
    async fn call_tool(&self, call: &ToolCall, tools: &ToolRegistry) -> String {
        if !self.spec.tools.iter().any(|t| t == &call.name) {
            warn!(agent = %self.spec.key, tool = %call.name, "Agent requested a tool it was not given");
            return json!({ "error": format!("Tool '{}' is not available to this agent", call.name) })
                .to_string();
        }

        if !call.arguments.is_object() {
            warn!(agent = %self.spec.key, tool = %call.name, "Tool call arguments are not a JSON object");
            return json!({
                "error": format!("Arguments for tool '{}' must be a JSON object", call.name)
            })
            .to_string();
        }

        debug!(agent = %self.spec.key, tool = %call.name, "Calling tool");
        match timeout(TOOL_TIMEOUT, tools.execute(&call.name, call.arguments.clone())).await {
            Ok(Ok(value)) => value.to_string(),
            Ok(Err(e)) => {
                warn!(tool = %call.name, "Tool call failed: {}", e);
                json!({ "error": e.to_string() }).to_string()
            }
            Err(_) => json!({ "error": "Tool execution timed out" }).to_string(),
        }
    }
}
