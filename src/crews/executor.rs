//! Runs a crew against a user's conversation memory.
//!
//! One call to [`CrewExecutor::execute_crew`]:
//!
//! 1. makes sure the user and the session exist in the memory service,
//! 2. appends the inbound message to the session,
//! 3. builds a context block from a graph search and the recent history,
//! 4. kicks the crew off once with the message, context and current time,
//! 5. writes the crew's answer back to the session.
//!
//! Failures in (3) degrade to placeholder text and failures in (5) are only
//! logged. Everything else aborts the call.

use super::{CrewInputs, CrewOutput, CrewRegistry};
use crate::llm::LLMClientFactoryTrait;
use crate::memory::context::{
    format_graph_search_results, format_session_messages, GRAPH_CONTEXT_UNAVAILABLE,
    HISTORY_UNAVAILABLE,
};
use crate::memory::{GraphSearchQuery, MemoryMessage, MemoryStore, MemoryUser};
use crate::tools::ToolRegistry;
use crate::types::{AppError, GraphSearchOverrides, Result, DEFAULT_HISTORY_LIMIT};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Graph search result count when the caller does not override it.
pub const DEFAULT_GRAPH_SEARCH_LIMIT: u32 = 5;

const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S %z";

pub struct CrewExecutor {
    memory: Option<Arc<dyn MemoryStore>>,
    llm_factory: Arc<dyn LLMClientFactoryTrait>,
    tools: Arc<ToolRegistry>,
    crews: Arc<CrewRegistry>,
    offset: FixedOffset,
}

impl CrewExecutor {
    pub fn new(
        memory: Option<Arc<dyn MemoryStore>>,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        tools: Arc<ToolRegistry>,
        crews: Arc<CrewRegistry>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            memory,
            llm_factory,
            tools,
            crews,
            offset,
        }
    }

    pub async fn execute_crew(
        &self,
        crew_name: &str,
        message: &str,
        user_id: &str,
        session_id: &str,
        history_limit: Option<u32>,
        overrides: GraphSearchOverrides,
    ) -> Result<CrewOutput> {
        let memory = self.memory.as_deref().ok_or_else(|| {
            error!("Memory client is not configured; set ZEP_API_KEY");
            AppError::Configuration("Memory service client is not initialized.".to_string())
        })?;

        let crew = self.crews.get(crew_name).inspect_err(|_| {
            warn!(crew = %crew_name, "Requested crew does not exist");
        })?;

        ensure_user(memory, user_id).await?;
        ensure_session(memory, session_id, user_id).await?;

        memory
            .add_messages(session_id, &[MemoryMessage::user(message)])
            .await?;
        info!(session = %session_id, "User message added to session");

        let search = GraphSearchQuery {
            query: message.to_string(),
            user_id: user_id.to_string(),
            scope: overrides.scope.unwrap_or_default(),
            reranker: overrides.reranker.unwrap_or_default(),
            limit: overrides.limit.unwrap_or(DEFAULT_GRAPH_SEARCH_LIMIT),
        };
        let history_limit = history_limit
            .filter(|&limit| limit > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let graph_context = self.graph_context(memory, &search).await;
        let history_context = self
            .history_context(memory, session_id, history_limit)
            .await;
        let zep_context = format!("{}\n\n{}", graph_context, history_context);

        let current_datetime = Utc::now()
            .with_timezone(&self.offset)
            .format(DATETIME_FORMAT)
            .to_string();

        let inputs: CrewInputs = [
            ("message".to_string(), message.to_string()),
            ("zep_context".to_string(), zep_context),
            ("current_datetime".to_string(), current_datetime),
        ]
        .into();

        info!(
            crew = %crew.name,
            context_len = inputs["zep_context"].len(),
            current_datetime = %inputs["current_datetime"],
            "Starting crew"
        );

        let llm = self.llm_factory.create_default().await?;
        let output = crew.kickoff(&inputs, llm.as_ref(), &self.tools).await?;

        let answer = output.text();
        if answer.is_empty() {
            warn!(crew = %crew.name, "Crew returned an empty result; nothing written to memory");
        } else if let Err(e) = memory
            .add_messages(session_id, &[MemoryMessage::assistant(answer)])
            .await
        {
            error!(session = %session_id, "Failed to store assistant message: {}", e);
        }

        info!(crew = %crew.name, session = %session_id, "Crew finished");
        Ok(output)
    }

    async fn graph_context(&self, memory: &dyn MemoryStore, search: &GraphSearchQuery) -> String {
        match memory.graph_search(search).await {
            Ok(results) => {
                info!(
                    nodes = results.nodes.len(),
                    edges = results.edges.len(),
                    scope = search.scope.as_str(),
                    "Graph search completed"
                );
                format_graph_search_results(
                    &results,
                    search.scope,
                    search.reranker,
                    search.limit,
                    &search.query,
                )
            }
            Err(e) => {
                error!("Graph search failed: {}", e);
                GRAPH_CONTEXT_UNAVAILABLE.to_string()
            }
        }
    }

    async fn history_context(&self, memory: &dyn MemoryStore, session_id: &str, limit: u32) -> String {
        match memory.get_session_messages(session_id, limit).await {
            Ok(messages) => format_session_messages(&messages, limit, self.offset),
            Err(e) => {
                error!(session = %session_id, "Failed to fetch session history: {}", e);
                HISTORY_UNAVAILABLE.to_string()
            }
        }
    }
}

async fn ensure_user(memory: &dyn MemoryStore, user_id: &str) -> Result<()> {
    match memory.get_user(user_id).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            memory.add_user(&MemoryUser::placeholder(user_id)).await?;
            info!(user = %user_id, "Created memory user");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn ensure_session(memory: &dyn MemoryStore, session_id: &str, user_id: &str) -> Result<()> {
    match memory.get_session(session_id).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            memory.add_session(session_id, user_id).await?;
            info!(session = %session_id, user = %user_id, "Created memory session");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
