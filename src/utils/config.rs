use crate::llm::Provider;
use chrono::{FixedOffset, Offset, Utc};
use std::collections::HashMap;
use std::env;

/// Origins that are always allowed by the CORS layer.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost", "http://localhost:3000"];

pub const DEFAULT_ZEP_API_URL: &str = "https://api.getzep.com/api/v2";

/// Tracing filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub memory: MemoryConfig,
    pub llm: LLMConfig,
    pub tools: ToolsConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub title: String,
    pub version: String,
    pub docs_enabled: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for the `/v1` routes. `None` rejects every protected call.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub zep_api_key: Option<String>,
    pub zep_api_url: String,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub serper_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Offset used to render timestamps in the crew context.
    pub utc_offset_hours: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },

    #[error("Unknown LLM provider '{0}' (expected 'openai' or 'ollama')")]
    UnknownProvider(String),
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from a fixed set of variables.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| get(name).filter(|v| !v.trim().is_empty());
        let or_default =
            |name: &str, default: &str| non_empty(name).unwrap_or_else(|| default.to_string());

        Ok(Config {
            server: ServerConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parse_var("PORT", non_empty("PORT"), 8000)?,
                title: or_default("API_TITLE", "CrewAI API with Zep Memory"),
                version: or_default("API_VERSION", "1.1"),
                docs_enabled: parse_bool("DOCS_ENABLED", non_empty("DOCS_ENABLED"), true)?,
                cors_origins: cors_origin_list(non_empty("CORS_ORIGINS").as_deref()),
            },
            auth: AuthConfig {
                bearer_token: non_empty("BEARER_TOKEN"),
            },
            memory: MemoryConfig {
                zep_api_key: non_empty("ZEP_API_KEY"),
                zep_api_url: or_default("ZEP_API_URL", DEFAULT_ZEP_API_URL),
            },
            llm: LLMConfig {
                provider: or_default("LLM_PROVIDER", "openai").to_lowercase(),
                openai_api_key: non_empty("OPENAI_API_KEY"),
                openai_api_base: or_default("OPENAI_API_BASE", "https://api.openai.com/v1"),
                openai_model: or_default("OPENAI_MODEL_NAME", "gpt-4o-mini"),
                ollama_url: or_default("OLLAMA_URL", "http://localhost:11434"),
                ollama_model: or_default("OLLAMA_MODEL", "llama3.2"),
            },
            tools: ToolsConfig {
                serper_api_key: non_empty("SERPER_API_KEY"),
            },
            context: ContextConfig {
                utc_offset_hours: parse_var(
                    "CONTEXT_UTC_OFFSET_HOURS",
                    non_empty("CONTEXT_UTC_OFFSET_HOURS"),
                    -3,
                )?,
            },
        })
    }

    /// The LLM provider selected by `LLM_PROVIDER`.
    pub fn llm_provider(&self) -> Result<Provider, ConfigError> {
        match self.llm.provider.as_str() {
            "openai" => Ok(Provider::OpenAI {
                api_key: self.llm.openai_api_key.clone().unwrap_or_default(),
                api_base: self.llm.openai_api_base.clone(),
                model: self.llm.openai_model.clone(),
            }),
            "ollama" => Ok(Provider::Ollama {
                base_url: self.llm.ollama_url.clone(),
                model: self.llm.ollama_model.clone(),
            }),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// Fixed offset for context timestamps. Out-of-range hours fall back to UTC.
    pub fn context_offset(&self) -> FixedOffset {
        self.context
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: v,
        }),
    }
}

/// Merge configured origins with the defaults, dropping blanks and duplicates.
pub fn cors_origin_list(raw: Option<&str>) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    let configured = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty());

    for origin in configured.chain(DEFAULT_CORS_ORIGINS.iter().copied()) {
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_map(&HashMap::new()).unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.server.docs_enabled);
        assert!(config.auth.bearer_token.is_none());
        assert!(config.memory.zep_api_key.is_none());
        assert_eq!(config.memory.zep_api_url, DEFAULT_ZEP_API_URL);
        assert_eq!(config.context.utc_offset_hours, -3);
        assert_eq!(config.server.cors_origins.len(), 2);
    }

    #[test]
    fn test_blank_secrets_are_treated_as_missing() {
        let config = Config::from_map(&vars(&[("BEARER_TOKEN", "  "), ("ZEP_API_KEY", "")]))
            .unwrap();
        assert!(config.auth.bearer_token.is_none());
        assert!(config.memory.zep_api_key.is_none());
    }

    #[test]
    fn test_cors_origins_are_merged_and_deduplicated() {
        let origins = cors_origin_list(Some("https://app.example.com, http://localhost,,"));
        assert_eq!(
            origins,
            vec![
                "https://app.example.com".to_string(),
                "http://localhost".to_string(),
                "http://localhost:3000".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_map(&vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_docs_flag_parsing() {
        let config = Config::from_map(&vars(&[("DOCS_ENABLED", "false")])).unwrap();
        assert!(!config.server.docs_enabled);
        assert!(Config::from_map(&vars(&[("DOCS_ENABLED", "maybe")])).is_err());
    }

    #[test]
    fn test_provider_selection() {
        let config = Config::from_map(&vars(&[
            ("LLM_PROVIDER", "Ollama"),
            ("OLLAMA_MODEL", "qwen2.5"),
        ]))
        .unwrap();
        let provider = config.llm_provider().unwrap();
        assert_eq!(provider.name(), "Ollama");

        let config = Config::from_map(&vars(&[("LLM_PROVIDER", "bedrock")])).unwrap();
        assert!(matches!(
            config.llm_provider(),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_context_offset() {
        let config = Config::from_map(&vars(&[("CONTEXT_UTC_OFFSET_HOURS", "2")])).unwrap();
        assert_eq!(config.context_offset().local_minus_utc(), 7200);

        let config = Config::from_map(&vars(&[("CONTEXT_UTC_OFFSET_HOURS", "99")])).unwrap();
        assert_eq!(config.context_offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_default_log_filter_is_valid() {
        assert_eq!(DEFAULT_LOG_FILTER, "info,tower_http=debug");
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
