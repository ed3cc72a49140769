//! LLM-based query entity extraction.
//!
//! The extractor prompts an LLM with a one-shot example and turns its reply
//! into an [`ExtractionResult`].
//!
//! # Response modes
//!
//! The call shape depends on the client's capabilities, not its type:
//!
//! 1. **JSON mode** (`supports_json_mode`): temperature/token cap/stop plus
//!    a JSON response format. The reply is parsed as-is.
//! 2. **Local model** (`is_local_model`): no generation options at all. The
//!    JSON object is located inside the free-text reply.
//! 3. **Plain text**: temperature/token cap/stop without JSON mode, then the
//!    same object location as the local path.
//!
//! Malformed replies are never errors: they become an
//! [`ExtractionFailure`] on the result. Client failures are returned as
//! errors so the containing batch aborts.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::error::GnerResult;
use crate::traits::{GenerationOptions, Llm, LlmResponse};

use super::json_parser::{named_entities_from_value, parse_named_entities};
use super::prompts::build_ner_messages;
use super::result::{ExtractionFailure, ExtractionResult};

/// How a client is called and its reply interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Native JSON output.
    JsonMode,
    /// Locally served model, free text, no usage reporting.
    LocalModel,
    /// Remote model without JSON mode.
    PlainText,
}

impl ResponseMode {
    /// Pick the mode from the client's capability flags.
    pub fn for_llm(llm: &dyn Llm) -> Self {
        if llm.supports_json_mode() {
            Self::JsonMode
        } else if llm.is_local_model() {
            Self::LocalModel
        } else {
            Self::PlainText
        }
    }
}

/// Query entity extractor over a single client.
pub struct EntityExtractor {
    llm: Arc<dyn Llm>,
    config: ExtractionConfig,
}

impl EntityExtractor {
    /// Create a new entity extractor with default call parameters.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::with_config(llm, ExtractionConfig::default())
    }

    /// Create an extractor with explicit call parameters.
    pub fn with_config(llm: Arc<dyn Llm>, config: ExtractionConfig) -> Self {
        Self { llm, config }
    }

    /// The underlying client.
    pub fn llm(&self) -> &Arc<dyn Llm> {
        &self.llm
    }

    /// Response mode used for this client.
    pub fn mode(&self) -> ResponseMode {
        ResponseMode::for_llm(self.llm.as_ref())
    }

    /// Extract named entities from one text.
    pub async fn extract(&self, text: &str) -> GnerResult<ExtractionResult> {
        let messages = build_ner_messages(text);
        let mode = self.mode();

        let options: Option<GenerationOptions> = match mode {
            ResponseMode::JsonMode => Some(self.config.generation_options(true)),
            ResponseMode::LocalModel => None,
            ResponseMode::PlainText => Some(self.config.generation_options(false)),
        };

        let response = self.llm.generate(&messages, options).await?;
        let total_tokens = Self::token_count(&response);
        let content = response.content_or_empty();

        let outcome = match mode {
            ResponseMode::JsonMode => Self::parse_json_mode(content),
            ResponseMode::LocalModel | ResponseMode::PlainText => parse_named_entities(content),
        };

        match &outcome {
            Ok(entities) => debug!(
                model = self.llm.model_name(),
                entities = entities.len(),
                total_tokens,
                "Extracted query entities"
            ),
            Err(failure) => warn!(
                model = self.llm.model_name(),
                mode = ?mode,
                error = %failure,
                "Query NER failed, substituting empty entity list"
            ),
        }

        Ok(ExtractionResult {
            outcome,
            total_tokens,
        })
    }

    /// JSON mode output is trusted to be a JSON document; no span search or
    /// repair is attempted.
    fn parse_json_mode(content: &str) -> Result<Vec<String>, ExtractionFailure> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ExtractionFailure::InvalidJson(e.to_string()))?;
        named_entities_from_value(&value)
    }

    /// Reported usage, or whitespace tokens of the reply when unreported.
    fn token_count(response: &LlmResponse) -> u64 {
        match &response.usage {
            Some(usage) => u64::from(usage.total_tokens),
            None => response.content_or_empty().split_whitespace().count() as u64,
        }
    }
}
