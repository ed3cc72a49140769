//! Core traits for gner.

mod embedder;
mod llm;

pub use embedder::{Embedder, EmbedderConfig, EmbedderProvider};
pub use llm::{
    GenerationOptions, Llm, LlmConfig, LlmConnector, LlmResponse, ResponseFormat, TokenUsage,
};
