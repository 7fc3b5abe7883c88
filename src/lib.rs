//! # crew-memory-server
//!
//! An HTTP gateway that runs agent crews with long-term conversational memory
//! kept in Zep Cloud.
//!
//! Each `POST /v1/create_crew/` call makes sure the user and the session exist
//! in the memory service, stores the inbound message, assembles a context
//! block from a knowledge-graph search and the recent session history, runs
//! the requested crew once, and stores the crew's answer back in the session.
//!
//! ## Library usage
//!
//! ```rust,ignore
//! use crew_memory::{create_app, AppState, utils::config::Config};
//!
//! let config = Config::from_env()?;
//! let state = AppState::from_config(config)?;
//! let app = create_app(state);
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST handlers and routes
//! - [`auth`] - Bearer token middleware
//! - [`crews`] - Crew definitions, agent loop and the memory-aware executor
//! - [`llm`] - OpenAI and Ollama chat clients
//! - [`memory`] - Memory service client and context formatting
//! - [`tools`] - Tools crews can call (web search, scraping)
//! - [`types`] - Wire types and errors
//! - [`utils`] - Environment configuration

/// HTTP API handlers and routes.
pub mod api;
/// Bearer token authentication.
pub mod auth;
/// Agent crews and their execution.
pub mod crews;
/// LLM provider clients and abstractions.
pub mod llm;
/// Memory service client and context formatting.
pub mod memory;
/// Tools available to crew agents.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use crews::{CrewExecutor, CrewRegistry};
pub use llm::{LLMClient, LLMClientFactory, LLMClientFactoryTrait, LLMResponse, Provider};
pub use memory::{MemoryStore, ZepClient};
pub use tools::ToolRegistry;
pub use types::{AppError, Result};

use crate::utils::config::Config;
use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Environment configuration
    pub config: Arc<Config>,
    /// Memory service client; `None` when `ZEP_API_KEY` is not set
    pub memory: Option<Arc<dyn MemoryStore>>,
    /// LLM client factory
    pub llm_factory: Arc<dyn LLMClientFactoryTrait>,
    /// Tools crew agents may call
    pub tool_registry: Arc<ToolRegistry>,
    /// Crews that can be requested by name
    pub crews: Arc<CrewRegistry>,
}

impl AppState {
    /// Build production state: Zep client (when keyed), configured LLM provider,
    /// default tools and the built-in crews.
    pub fn from_config(config: Config) -> Result<Self> {
        let memory: Option<Arc<dyn MemoryStore>> = match &config.memory.zep_api_key {
            Some(key) => {
                let client: Arc<dyn MemoryStore> =
                    Arc::new(ZepClient::new(key.clone(), &config.memory.zep_api_url)?);
                Some(client)
            }
            None => None,
        };

        let provider = config
            .llm_provider()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Ok(Self {
            memory,
            llm_factory: Arc::new(LLMClientFactory::new(provider)),
            tool_registry: Arc::new(ToolRegistry::with_default_tools(&config.tools)),
            crews: Arc::new(CrewRegistry::new()),
            config: Arc::new(config),
        })
    }

    /// Executor bound to this state's clients and registries.
    pub fn executor(&self) -> CrewExecutor {
        CrewExecutor::new(
            self.memory.clone(),
            self.llm_factory.clone(),
            self.tool_registry.clone(),
            self.crews.clone(),
            self.config.context_offset(),
        )
    }
}

/// Full application router with CORS, tracing and body limits applied.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    api::routes::create_router(state.clone())
        .layer(DefaultBodyLimit::disable())
        .layer(middleware)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
