//! Sequential extraction over a list of texts.

use tracing::{debug, info};

use crate::error::GnerResult;

use super::extractor::EntityExtractor;
use super::result::BatchResult;

/// Run the extractor over `texts` in order.
///
/// The first client error aborts the batch; malformed replies do not.
pub async fn run_ner_on_texts<S: AsRef<str>>(
    extractor: &EntityExtractor,
    texts: &[S],
) -> GnerResult<BatchResult> {
    let mut batch = BatchResult::new();

    for (index, text) in texts.iter().enumerate() {
        let result = extractor.extract(text.as_ref()).await?;
        debug!(
            index,
            of = texts.len(),
            tokens = result.total_tokens,
            "NER item done"
        );
        batch.push(result);
    }

    info!(
        model = extractor.llm().model_name(),
        texts = batch.len(),
        failures = batch.failure_count(),
        total_tokens = batch.total_tokens,
        "NER batch complete"
    );

    Ok(batch)
}
