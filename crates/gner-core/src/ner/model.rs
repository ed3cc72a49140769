//! Single-query NER model used at retrieval time.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ExtractionConfig;
use crate::error::GnerResult;
use crate::traits::Llm;

use super::extractor::EntityExtractor;

/// Anything that turns a query into normalized entity strings.
#[async_trait]
pub trait NerModel: Send + Sync {
    /// Extract normalized entities from one query.
    async fn extract_entities(&self, text: &str) -> GnerResult<Vec<String>>;
}

/// NER model backed by an LLM client.
///
/// Unlike the batch path, this returns normalized entities directly. A reply
/// that cannot be parsed yields an empty list.
pub struct LlmNerModel {
    extractor: EntityExtractor,
}

impl LlmNerModel {
    /// Create a model over an existing client.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            extractor: EntityExtractor::new(llm),
        }
    }

    /// Create a model with explicit call parameters.
    pub fn with_config(llm: Arc<dyn Llm>, config: ExtractionConfig) -> Self {
        Self {
            extractor: EntityExtractor::with_config(llm, config),
        }
    }

    /// Model name of the underlying client.
    pub fn model_name(&self) -> &str {
        self.extractor.llm().model_name()
    }
}

#[async_trait]
impl NerModel for LlmNerModel {
    async fn extract_entities(&self, text: &str) -> GnerResult<Vec<String>> {
        let result = self.extractor.extract(text).await?;
        Ok(result.normalized_entities())
    }
}
