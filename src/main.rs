use anyhow::{Context, Result};
use crew_memory::{
    AppState, LLMClientFactoryTrait, create_app,
    utils::config::{Config, DEFAULT_LOG_FILTER},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!(
        "Starting {} v{} ({})",
        config.server.title,
        config.server.version,
        env!("CARGO_PKG_VERSION")
    );

    if config.auth.bearer_token.is_none() {
        warn!("BEARER_TOKEN is not set: every /v1 request will be rejected with 500");
    }
    if config.memory.zep_api_key.is_none() {
        warn!("ZEP_API_KEY is not set: crews cannot run without the memory service");
    }
    if config.llm.provider == "openai" && config.llm.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set: crew runs will fail");
    }
    if config.tools.serper_api_key.is_none() {
        warn!("SERPER_API_KEY is not set: the web_search tool will report errors to agents");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config).context("Failed to initialise application state")?;
    info!(
        provider = state.llm_factory.default_provider().name(),
        model = state.llm_factory.default_provider().model(),
        crews = ?state.crews.names(),
        "Application state ready"
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
