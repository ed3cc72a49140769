//! Per-item and per-batch extraction results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::normalize_entities;

/// Why a model response could not be turned into an entity list.
///
/// These are recovered locally: the item is kept with no entities and the
/// batch continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// The response contained no `{ ... }` span.
    #[error("no JSON object found in response")]
    NoJsonObject,
    /// The candidate JSON could not be parsed, even after repair.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// The object has no `named_entities` key.
    #[error("response is missing the named_entities key")]
    MissingNamedEntities,
    /// `named_entities` is present but is not a list of strings.
    #[error("named_entities is not a list of strings")]
    NotAStringList,
}

/// Outcome of extracting entities from one text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Entity strings exactly as the model returned them, or the failure.
    pub outcome: Result<Vec<String>, ExtractionFailure>,
    /// Tokens consumed: reported usage, or a whitespace count when the
    /// backend reports none.
    pub total_tokens: u64,
}

impl ExtractionResult {
    /// Successful extraction.
    pub fn extracted(entities: Vec<String>, total_tokens: u64) -> Self {
        Self {
            outcome: Ok(entities),
            total_tokens,
        }
    }

    /// Failed extraction.
    pub fn failed(failure: ExtractionFailure, total_tokens: u64) -> Self {
        Self {
            outcome: Err(failure),
            total_tokens,
        }
    }

    /// Raw entities; empty when extraction failed.
    pub fn entities(&self) -> &[String] {
        match &self.outcome {
            Ok(entities) => entities,
            Err(_) => &[],
        }
    }

    /// Normalized entities; empty when extraction failed.
    pub fn normalized_entities(&self) -> Vec<String> {
        normalize_entities(self.entities())
    }

    /// Whether the response was parsed successfully.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&ExtractionFailure> {
        self.outcome.as_ref().err()
    }

    /// The `{"named_entities": [...]}` document stored in the cache.
    pub fn to_named_entities_json(&self) -> String {
        let doc = NamedEntities {
            named_entities: self.entities().to_vec(),
        };
        // Serializing a struct of strings cannot fail.
        serde_json::to_string(&doc).unwrap_or_else(|_| r#"{"named_entities":[]}"#.to_string())
    }
}

/// Wire shape of the entity document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntities {
    pub named_entities: Vec<String>,
}

/// Ordered results for a batch of texts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    /// One result per input text, in input order.
    pub results: Vec<ExtractionResult>,
    /// Sum of `total_tokens` over `results`.
    pub total_tokens: u64,
}

impl BatchResult {
    /// Create an empty batch result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one result.
    pub fn push(&mut self, result: ExtractionResult) {
        self.total_tokens += result.total_tokens;
        self.results.push(result);
    }

    /// Append all results of another batch, preserving order.
    pub fn extend(&mut self, other: BatchResult) {
        self.total_tokens += other.total_tokens;
        self.results.extend(other.results);
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Count of failed extractions.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Estimated cost in USD at the given price per thousand tokens.
    pub fn estimated_cost(&self, usd_per_1k_tokens: f64) -> f64 {
        usd_per_1k_tokens * self.total_tokens as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_entities() {
        let result = ExtractionResult::failed(ExtractionFailure::NoJsonObject, 7);
        assert!(result.entities().is_empty());
        assert!(!result.is_success());
        assert_eq!(result.to_named_entities_json(), r#"{"named_entities":[]}"#);
    }

    #[test]
    fn test_normalized_entities() {
        let result = ExtractionResult::extracted(
            vec!["First for Women".into(), "Arthur's Magazine".into()],
            10,
        );
        assert_eq!(
            result.normalized_entities(),
            vec!["first for women", "arthur s magazine"]
        );
    }

    #[test]
    fn test_batch_accumulates_tokens() {
        let mut batch = BatchResult::new();
        batch.push(ExtractionResult::extracted(vec!["a".into()], 3));
        batch.push(ExtractionResult::failed(ExtractionFailure::MissingNamedEntities, 4));

        let mut other = BatchResult::new();
        other.push(ExtractionResult::extracted(vec![], 5));
        batch.extend(other);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.total_tokens, 12);
        assert_eq!(batch.failure_count(), 1);
        assert!((batch.estimated_cost(0.002) - 0.000024).abs() < 1e-12);
    }
}
