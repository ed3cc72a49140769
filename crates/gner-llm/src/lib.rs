//! gner-llm - LLM provider implementations for gner.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - chat models with native JSON mode
//! - **Together** - hosted models behind an OpenAI-compatible endpoint
//! - **Ollama** (feature: `ollama`) - local models via Ollama
//! - **llama.cpp** - a local `llama-server` exposing the OpenAI-compatible API
//!
//! # Example
//!
//! ```ignore
//! use gner_llm::LlmFactory;
//!
//! // The default extraction model
//! let llm = LlmFactory::openai()?;
//!
//! // Resolve a provider from its command-line name
//! let llm = LlmFactory::from_name("together", "meta-llama/Llama-3-8b-chat-hf")?;
//! ```

mod compat;
mod factory;
mod ollama;
mod openai;

pub use compat::{CompatLlm, LLAMA_CPP_API_URL, TOGETHER_API_URL};
pub use factory::LlmFactory;
pub use ollama::OllamaLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use gner_core::config::LlmProvider;
pub use gner_core::traits::{
    GenerationOptions, Llm, LlmConfig, LlmConnector, LlmResponse, ResponseFormat,
};
