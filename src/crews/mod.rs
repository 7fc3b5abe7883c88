//! Agent crews
//!
//! A [`Crew`] is a static pipeline: a set of agents ([`AgentSpec`]) and an
//! ordered list of tasks ([`TaskSpec`]), each assigned to one agent. Task text
//! may contain `{placeholders}` that are filled from the inputs given to
//! [`Crew::kickoff`]. Tasks run one after another; a task sees the outputs of
//! the tasks it lists as context, or the previous task's output when it lists
//! none.
//!
//! Crews are looked up by name through [`CrewRegistry`] and run with memory
//! context by [`CrewExecutor`].

pub mod agent;
pub mod basic;
pub mod development;
pub mod executor;
pub mod registry;
pub mod research;

pub use agent::{AgentSpec, CrewAgent};
pub use executor::CrewExecutor;
pub use registry::CrewRegistry;

use crate::llm::LLMClient;
use crate::tools::ToolRegistry;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Named values substituted into task text.
pub type CrewInputs = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    #[default]
    Sequential,
}

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    /// Key of the [`AgentSpec`] that performs this task.
    pub agent: String,
    /// Names of earlier tasks whose output is passed in.
    pub context: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Crew {
    pub name: String,
    pub agents: Vec<AgentSpec>,
    pub tasks: Vec<TaskSpec>,
    pub process: Process,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskOutput {
    pub name: String,
    /// Role of the agent that produced this output.
    pub agent: String,
    pub raw: String,
}

/// Result of a crew run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CrewOutput {
    /// Output of the final task.
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Trimmed text of the run: `raw`, else the last non-blank task output.
    pub fn text(&self) -> String {
        let raw = self.raw.trim();
        if !raw.is_empty() {
            return raw.to_string();
        }
        self.tasks_output
            .iter()
            .rev()
            .map(|t| t.raw.trim())
            .find(|t| !t.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

impl Crew {
    pub fn agent(&self, key: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.key == key)
    }

    pub async fn kickoff(
        &self,
        inputs: &CrewInputs,
        llm: &dyn LLMClient,
        tools: &ToolRegistry,
    ) -> Result<CrewOutput> {
        match self.process {
            Process::Sequential => self.run_sequential(inputs, llm, tools).await,
        }
    }

    async fn run_sequential(
        &self,
        inputs: &CrewInputs,
        llm: &dyn LLMClient,
        tools: &ToolRegistry,
    ) -> Result<CrewOutput> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            let spec = self.agent(&task.agent).ok_or_else(|| {
                AppError::Internal(format!(
                    "Task '{}' of crew '{}' references unknown agent '{}'",
                    task.name, self.name, task.agent
                ))
            })?;

            let context = task_context(task, &outputs);
            let prompt = task_prompt(task, inputs, context.as_deref());

            info!(crew = %self.name, task = %task.name, agent = %spec.role, "Running task");
            let agent = CrewAgent::new(spec, inputs);
            let raw = agent.run(&prompt, llm, tools).await?;
            debug!(task = %task.name, output_len = raw.len(), "Task finished");

            outputs.push(TaskOutput {
                name: task.name.clone(),
                agent: spec.role.clone(),
                raw,
            });
        }

        Ok(CrewOutput {
            raw: outputs.last().map(|o| o.raw.clone()).unwrap_or_default(),
            tasks_output: outputs,
        })
    }
}

fn task_context(task: &TaskSpec, done: &[TaskOutput]) -> Option<String> {
    if task.context.is_empty() {
        return done.last().map(|o| o.raw.clone());
    }
    let parts: Vec<&str> = task
        .context
        .iter()
        .filter_map(|name| done.iter().find(|o| &o.name == name))
        .map(|o| o.raw.as_str())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n----------\n\n"))
    }
}

fn task_prompt(task: &TaskSpec, inputs: &CrewInputs, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\nYou MUST return the actual complete content as the final answer, not a summary.",
        interpolate(&task.description, inputs),
        interpolate(&task.expected_output, inputs),
    );
    if let Some(context) = context {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }
    prompt
}

/// Replace `{name}` with `inputs[name]`. Unknown names and braces that do not
/// enclose an identifier are left untouched; substituted values are not
/// rescanned.
pub fn interpolate(template: &str, inputs: &CrewInputs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let key = &after[..key_len];

        match (after[key_len..].starts_with('}'), inputs.get(key)) {
            (true, Some(value)) if !key.is_empty() => {
                out.push_str(value);
                rest = &after[key_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
