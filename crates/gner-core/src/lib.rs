//! gner-core - Core library for gner.
//!
//! This crate provides the traits, types, and query named-entity extraction
//! pipeline used to prepare questions for knowledge-graph retrieval.
//!
//! # Example
//!
//! ```ignore
//! use gner_core::{GnerConfig, QueryNerDriver};
//!
//! let config = GnerConfig::from_env();
//! let connector = gner_llm::LlmFactory::connector(config.llm.clone());
//! let driver = QueryNerDriver::new(&config, "hotpotqa", connector)?;
//!
//! match driver.run().await {
//!     DriverOutcome::Computed { rows, .. } => println!("extracted {rows} queries"),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod ner;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ExtractionConfig, GnerConfig, LlmProvider, LlmProviderConfig};
pub use dataset::{DatasetLayout, DriverOutcome, QueryNerDriver};
pub use error::{ErrorCode, GnerError, GnerResult};
pub use ner::{
    BatchResult, EntityExtractor, ExtractionFailure, ExtractionResult, LlmNerModel, NerModel,
    ParallelDispatcher,
};
pub use traits::{Embedder, EmbedderConfig, Llm, LlmConfig, LlmConnector};
pub use types::{Message, MessageRole};
