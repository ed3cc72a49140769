//! gner-embeddings - Embedding providers and the text embedding model.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//! - **Ollama** (feature: `ollama`) - Local embedding models via Ollama
//!
//! [`TextEmbModel`] wraps any provider with query/passage instructions,
//! batching and optional L2 normalization.
//!
//! # Example
//!
//! ```ignore
//! use gner_embeddings::{EmbedderFactory, TextEmbModel, TextEmbOptions};
//!
//! let embedder = EmbedderFactory::ollama_with_model("nomic-embed-text", 768)?;
//! let model = TextEmbModel::new(
//!     embedder,
//!     TextEmbOptions {
//!         normalize: true,
//!         query_instruct: Some("search_query: ".to_string()),
//!         passage_instruct: Some("search_document: ".to_string()),
//!         ..Default::default()
//!     },
//! )?;
//! let vectors = model.encode(&questions, true, false).await?;
//! ```

mod factory;
mod ollama;
mod openai;
mod text_emb;

pub use factory::EmbedderFactory;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;
pub use text_emb::{l2_normalize, TextEmbModel, TextEmbOptions};

// Re-export core types for convenience
pub use gner_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
