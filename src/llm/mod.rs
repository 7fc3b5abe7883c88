//! LLM Provider Clients and Abstractions
//!
//! Crews talk to models only through the [`LLMClient`] trait. Clients are
//! created by an [`LLMClientFactoryTrait`] held in application state, which
//! lets tests substitute scripted models.
//!
//! # Supported Providers
//!
//! - `openai` - OpenAI API and compatible endpoints (`OPENAI_API_BASE`)
//! - `ollama` - Local Ollama server

/// Core LLM client trait, provider enum and factory.
pub mod client;
/// Ollama `/api/chat` client.
pub mod ollama;
/// OpenAI-compatible `/chat/completions` client.
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, LLMClientFactoryTrait, LLMResponse, Provider};
