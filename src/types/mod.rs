use crate::crews::CrewOutput;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Smallest and largest accepted `history_limit`.
pub const HISTORY_LIMIT_RANGE: (u32, u32) = (1, 50);

/// Smallest and largest accepted graph search limit override.
pub const GRAPH_LIMIT_RANGE: (u32, u32) = (1, 20);

/// Default number of session messages pulled into the crew context.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCrewRequest {
    /// Registered crew to run (e.g. `basic`, `research`).
    #[schema(example = "basic")]
    pub crew_name: String,
    #[schema(example = "What is the status of my order XYZ?")]
    pub message: String,
    #[schema(example = "user_abc_123")]
    pub user_id: String,
    #[schema(example = "session_xyz_789")]
    pub session_id: String,
    /// Number of session messages to pull into the context (1-50).
    #[serde(default = "default_history_limit")]
    #[schema(example = 5)]
    pub history_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zep_graph_search_scope_override: Option<SearchScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zep_graph_search_reranker_override: Option<Reranker>,
    /// Graph search result limit override (1-20).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zep_graph_search_limit_override: Option<u32>,
}

fn default_history_limit() -> Option<u32> {
    Some(DEFAULT_HISTORY_LIMIT)
}

impl CreateCrewRequest {
    /// Check numeric bounds that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.history_limit {
            check_range("history_limit", limit, HISTORY_LIMIT_RANGE)?;
        }
        if let Some(limit) = self.zep_graph_search_limit_override {
            check_range("zep_graph_search_limit_override", limit, GRAPH_LIMIT_RANGE)?;
        }
        Ok(())
    }

    /// Graph search overrides carried by this request.
    pub fn graph_overrides(&self) -> GraphSearchOverrides {
        GraphSearchOverrides {
            scope: self.zep_graph_search_scope_override,
            reranker: self.zep_graph_search_reranker_override,
            limit: self.zep_graph_search_limit_override,
        }
    }
}

fn check_range(field: &str, value: u32, (min, max): (u32, u32)) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCrewResponse {
    pub status: String,
    pub message: String,
    pub result: CrewOutput,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CrewListResponse {
    pub crews: Vec<String>,
}

// ============= Memory Types =============

/// Which part of the knowledge graph a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Edges,
    Nodes,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Edges => "edges",
            SearchScope::Nodes => "nodes",
        }
    }
}

/// Reranking strategy applied by the memory service to graph search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reranker {
    #[default]
    Rrf,
    Mmr,
    NodeDistance,
    EpisodeMentions,
    CrossEncoder,
}

impl Reranker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reranker::Rrf => "rrf",
            Reranker::Mmr => "mmr",
            Reranker::NodeDistance => "node_distance",
            Reranker::EpisodeMentions => "episode_mentions",
            Reranker::CrossEncoder => "cross_encoder",
        }
    }
}

/// Caller-supplied replacements for the graph search defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphSearchOverrides {
    pub scope: Option<SearchScope>,
    pub reranker: Option<Reranker>,
    pub limit: Option<u32>,
}

// ============= LLM Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }
}

/// One turn of a chat exchange with a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Assistant turn that requested tool calls.
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(ChatRole::Assistant, content)
        }
    }

    /// Result of a tool call, linked back to the request by id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(ChatRole::Tool, content)
        }
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Memory service error: {0}")]
    Memory(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short variant name, used in 500 response details and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AuthError",
            AppError::Configuration(_) => "ConfigError",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Validation(_) => "ValidationError",
            AppError::Memory(_) => "MemoryError",
            AppError::LLM(_) => "LLMError",
            AppError::Tool(_) => "ToolError",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AppError::Auth(_) => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Configuration(_)
            | AppError::Memory(_)
            | AppError::LLM(_)
            | AppError::Tool(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match self {
            AppError::Auth(msg)
            | AppError::Configuration(msg)
            | AppError::InvalidInput(msg)
            | AppError::Validation(msg)
            | AppError::Memory(msg)
            | AppError::LLM(msg)
            | AppError::Tool(msg)
            | AppError::Internal(msg) => msg,
        };

        let body = serde_json::json!({
            "detail": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
