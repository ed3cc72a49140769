//! Factory for creating LLM providers.

use std::sync::Arc;

use gner_core::config::{LlmProvider, LlmProviderConfig};
use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::{Llm, LlmConfig, LlmConnector};

use crate::compat::CompatLlm;
use crate::ollama::OllamaLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> GnerResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::OpenAI => Ok(Arc::new(OpenAIProvider::new(config)?)),
            LlmProvider::Together => Ok(Arc::new(CompatLlm::together(config)?)),
            LlmProvider::Ollama => Ok(Arc::new(OllamaLlm::new(config)?)),
            LlmProvider::LlamaCpp => Ok(Arc::new(CompatLlm::llama_cpp(config)?)),
        }
    }

    /// Create a provider from its command-line name (`openai`, `together`,
    /// `ollama`, `llama.cpp`) and a model name.
    pub fn from_name(llm: &str, model: impl Into<String>) -> GnerResult<Arc<dyn Llm>> {
        let provider: LlmProvider = llm.parse().map_err(|_| GnerError::UnsupportedProvider {
            provider: llm.to_string(),
        })?;
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(provider, config)
    }

    /// A connector that builds a fresh client from `config` on every call.
    ///
    /// Hand this to the dispatcher so each worker owns its client.
    pub fn connector(config: LlmProviderConfig) -> Arc<dyn LlmConnector> {
        Arc::new(move || Self::create(config.provider, config.config.clone()))
    }

    /// Create an OpenAI LLM provider with default configuration.
    pub fn openai() -> GnerResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::OpenAI, LlmConfig::default())
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> GnerResult<Arc<dyn Llm>> {
        Self::from_name("openai", model)
    }

    /// Create an Ollama LLM provider with a specific model.
    pub fn ollama_with_model(model: impl Into<String>) -> GnerResult<Arc<dyn Llm>> {
        Self::from_name("ollama", model)
    }
}
