//! Conversational memory backed by a remote memory service.
//!
//! The service owns users, sessions, message history and a knowledge graph
//! built from those messages. [`MemoryStore`] exposes one method per remote
//! call so the crew executor can be driven against [`ZepClient`] in
//! production and an in-process store in tests.
//!
//! [`context`] turns search hits and history into the text block handed to
//! crews.

pub mod context;
pub mod zep;

pub use zep::ZepClient;

use crate::types::{AppError, Reranker, SearchScope};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role name stored for inbound user messages.
pub const USER_ROLE: &str = "User";

/// Role name stored for crew answers.
pub const ASSISTANT_ROLE: &str = "AI Assistant";

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("memory service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl MemoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MemoryError::NotFound(_))
    }
}

impl From<MemoryError> for AppError {
    fn from(err: MemoryError) -> Self {
        AppError::Memory(err.to_string())
    }
}

pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUser {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl MemoryUser {
    /// Placeholder profile for a user seen for the first time.
    pub fn placeholder(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
            first_name: Some(user_id.to_string()),
            uuid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySession {
    pub session_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    pub content: String,
    /// RFC 3339 timestamp assigned by the service.
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing)]
    pub user_id: Option<String>,
}

impl MemoryMessage {
    fn new(role: &str, role_type: &str, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            role_type: Some(role_type.to_string()),
            content: content.into(),
            created_at: None,
            uuid: None,
            user_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_ROLE, "user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ASSISTANT_ROLE, "assistant", content)
    }
}

/// A graph search against one user's knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSearchQuery {
    pub query: String,
    pub user_id: String,
    pub scope: SearchScope,
    pub reranker: Reranker,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphSearchResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<EntityNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<EntityEdge>,
}

impl GraphSearchResults {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityNode {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityEdge {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fact: Option<String>,
    pub source_node_uuid: String,
    pub target_node_uuid: String,
    #[serde(default)]
    pub valid_at: Option<String>,
    #[serde(default)]
    pub invalid_at: Option<String>,
}

/// The service sends `null` for collections it has nothing for.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Remote memory operations used per crew request.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> MemoryResult<MemoryUser>;

    async fn add_user(&self, user: &MemoryUser) -> MemoryResult<MemoryUser>;

    async fn get_session(&self, session_id: &str) -> MemoryResult<MemorySession>;

    async fn add_session(&self, session_id: &str, user_id: &str) -> MemoryResult<MemorySession>;

    async fn add_messages(&self, session_id: &str, messages: &[MemoryMessage]) -> MemoryResult<()>;

    async fn graph_search(&self, query: &GraphSearchQuery) -> MemoryResult<GraphSearchResults>;

    /// Most recent messages of a session, oldest first.
    async fn get_session_messages(
        &self,
        session_id: &str,
        limit: u32,
    ) -> MemoryResult<Vec<MemoryMessage>>;
}
