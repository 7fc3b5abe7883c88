//! Mock implementations for testing.
//!
//! This module provides a scripted LLM client, a factory handing it out, and
//! an in-process [`MemoryStore`] so the HTTP surface and the crew executor can
//! be exercised without network access.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use crew_memory::llm::{LLMClient, LLMClientFactoryTrait, LLMResponse, Provider};
use crew_memory::memory::{
    EntityEdge, GraphSearchQuery, GraphSearchResults, MemoryError, MemoryMessage, MemoryResult,
    MemorySession, MemoryStore, MemoryUser,
};
use crew_memory::types::{AppError, ChatMessage, ChatRole, Result, ToolDefinition};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a [`MockLLMClient`] answers with.
#[derive(Clone, Debug)]
pub enum Reply {
    /// The same text every time.
    Fixed(String),
    /// The last user prompt it was sent, so tests can inspect the context.
    EchoPrompt,
    /// Whitespace only.
    Blank,
    /// An `AppError::LLM`.
    Fail,
}

/// Mock LLM client for testing with configurable responses.
///
/// Every prompt it receives is recorded and shared between clones.
///
/// ```ignore
/// let client = MockLLMClient::new("Hello, world!");
/// let echo = MockLLMClient::echo();
/// let broken = MockLLMClient::failing();
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    reply: Reply,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLMClient {
    pub fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self::with_reply(Reply::Fixed(response.to_string()))
    }

    pub fn echo() -> Self {
        Self::with_reply(Reply::EchoPrompt)
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    /// User prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn answer(&self, messages: &[ChatMessage]) -> Result<String> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());

        match &self.reply {
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::EchoPrompt => Ok(prompt),
            Reply::Blank => Ok("   ".to_string()),
            Reply::Fail => Err(AppError::LLM("Mock LLM failure".to_string())),
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        self.answer(messages)
    }

    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        Ok(LLMResponse {
            content: self.answer(messages)?,
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Mock LLM factory for tests requiring complete isolation from external services.
///
/// This factory always hands out clones of one `MockLLMClient`.
pub struct MockLLMFactory {
    provider: Provider,
    client: MockLLMClient,
}

impl MockLLMFactory {
    /// Create a new mock factory that returns the given mock client.
    pub fn new(client: MockLLMClient) -> Self {
        Self {
            provider: Provider::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "mock".to_string(),
            },
            client,
        }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    fn default_provider(&self) -> &Provider {
        &self.provider
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(self.client.clone()))
    }
}

/// Switches that make [`InMemoryMemoryStore`] calls fail.
#[derive(Default)]
pub struct Failures {
    /// `get_user` fails with a non-404 error.
    pub get_user: AtomicBool,
    pub add_user: AtomicBool,
    /// `get_session` fails with a non-404 error.
    pub get_session: AtomicBool,
    pub add_session: AtomicBool,
    pub graph_search: AtomicBool,
    pub history: AtomicBool,
    /// `add_messages` fails for user messages only.
    pub user_write: AtomicBool,
    /// `add_messages` fails for assistant messages only.
    pub assistant_write: AtomicBool,
}

impl Failures {
    fn check(flag: &AtomicBool, what: &str) -> MemoryResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(MemoryError::Api {
                status: 503,
                body: format!("{} unavailable", what),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct StoreState {
    users: HashMap<String, MemoryUser>,
    sessions: HashMap<String, MemorySession>,
    messages: HashMap<String, Vec<MemoryMessage>>,
    searches: Vec<GraphSearchQuery>,
}

/// In-process memory service.
///
/// Messages get increasing timestamps. Graph search returns one edge per
/// stored user message of the searching user, newest first, so earlier
/// statements surface as facts.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    state: Mutex<StoreState>,
    calls: Mutex<Vec<String>>,
    clock: AtomicUsize,
    pub failures: Failures,
}

impl InMemoryMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, pick: impl Fn(&Failures) -> &AtomicBool) {
        pick(&self.failures).store(true, Ordering::SeqCst);
    }

    pub fn user(&self, user_id: &str) -> Option<MemoryUser> {
        self.state.lock().unwrap().users.get(user_id).cloned()
    }

    pub fn session(&self, session_id: &str) -> Option<MemorySession> {
        self.state.lock().unwrap().sessions.get(session_id).cloned()
    }

    pub fn messages(&self, session_id: &str) -> Vec<MemoryMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn searches(&self) -> Vec<GraphSearchQuery> {
        self.state.lock().unwrap().searches.clone()
    }

    /// Start and end markers of the context reads, in the order they happened.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn next_timestamp(&self) -> String {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst) as i64;
        let base = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        (base + Duration::seconds(tick)).to_rfc3339()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn get_user(&self, user_id: &str) -> MemoryResult<MemoryUser> {
        Failures::check(&self.failures.get_user, "users")?;
        self.user(user_id)
            .ok_or_else(|| MemoryError::NotFound(format!("user '{}'", user_id)))
    }

    async fn add_user(&self, user: &MemoryUser) -> MemoryResult<MemoryUser> {
        Failures::check(&self.failures.add_user, "users")?;
        let mut state = self.state.lock().unwrap();
        state.users.insert(user.user_id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn get_session(&self, session_id: &str) -> MemoryResult<MemorySession> {
        Failures::check(&self.failures.get_session, "sessions")?;
        self.session(session_id)
            .ok_or_else(|| MemoryError::NotFound(format!("session '{}'", session_id)))
    }

    async fn add_session(&self, session_id: &str, user_id: &str) -> MemoryResult<MemorySession> {
        Failures::check(&self.failures.add_session, "sessions")?;
        let session = MemorySession {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            uuid: None,
        };
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    async fn add_messages(&self, session_id: &str, messages: &[MemoryMessage]) -> MemoryResult<()> {
        for message in messages {
            match message.role_type.as_deref() {
                Some("user") => Failures::check(&self.failures.user_write, "memory")?,
                Some("assistant") => Failures::check(&self.failures.assistant_write, "memory")?,
                _ => {}
            }
        }

        let stamped: Vec<MemoryMessage> = messages
            .iter()
            .map(|m| MemoryMessage {
                created_at: Some(self.next_timestamp()),
                ..m.clone()
            })
            .collect();

        let mut state = self.state.lock().unwrap();
        if !state.sessions.contains_key(session_id) {
            return Err(MemoryError::NotFound(format!("session '{}'", session_id)));
        }
        state
            .messages
            .entry(session_id.to_string())
            .or_default()
            .extend(stamped);
        Ok(())
    }

    async fn graph_search(&self, query: &GraphSearchQuery) -> MemoryResult<GraphSearchResults> {
        self.record("graph_search:start");
        // Give a concurrently polled history fetch the chance to start
        tokio::task::yield_now().await;
        let result = self.search_graph(query);
        self.record("graph_search:end");
        result
    }

    async fn get_session_messages(
        &self,
        session_id: &str,
        limit: u32,
    ) -> MemoryResult<Vec<MemoryMessage>> {
        self.record("history:start");
        Failures::check(&self.failures.history, "messages")?;
        let all = self.messages(session_id);
        let skip = all.len().saturating_sub(limit as usize);
        Ok(all.into_iter().skip(skip).collect())
    }
}

impl InMemoryMemoryStore {
    fn search_graph(&self, query: &GraphSearchQuery) -> MemoryResult<GraphSearchResults> {
        Failures::check(&self.failures.graph_search, "graph")?;
        let mut state = self.state.lock().unwrap();
        state.searches.push(query.clone());

        let user_sessions: Vec<&String> = state
            .sessions
            .values()
            .filter(|s| s.user_id == query.user_id)
            .map(|s| &s.session_id)
            .collect();

        let mut facts: Vec<&MemoryMessage> = user_sessions
            .iter()
            .filter_map(|id| state.messages.get(*id))
            .flatten()
            .filter(|m| m.role_type.as_deref() == Some("user"))
            .collect();
        facts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let edges = facts
            .into_iter()
            .take(query.limit as usize)
            .enumerate()
            .map(|(i, m)| EntityEdge {
                uuid: format!("edge-{}", i),
                name: Some("SAID".to_string()),
                fact: Some(format!("{} said: {}", query.user_id, m.content)),
                source_node_uuid: format!("user-{}", query.user_id),
                target_node_uuid: format!("topic-{}", i),
                valid_at: m.created_at.clone(),
                invalid_at: None,
            })
            .collect();

        Ok(GraphSearchResults {
            nodes: vec![],
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_generate() {
        let client = MockLLMClient::new("test response");
        let result = client
            .generate_with_history(&[ChatMessage::user("prompt")])
            .await;
        assert_eq!(result.unwrap(), "test response");
        assert_eq!(client.prompts(), vec!["prompt".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_client_failing() {
        let client = MockLLMClient::failing();
        assert!(client
            .generate_with_history(&[ChatMessage::user("prompt")])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_in_memory_history_limit() {
        let store = InMemoryMemoryStore::new();
        store.add_session("s1", "u1").await.unwrap();
        for i in 0..5 {
            store
                .add_messages("s1", &[MemoryMessage::user(format!("m{}", i))])
                .await
                .unwrap();
        }
        let recent = store.get_session_messages("s1", 2).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
    }
}
