//! Chunked parallel dispatch of the batch runner.
//!
//! The input is split into contiguous chunks, one per worker. Each worker is
//! an independent tokio task that builds its own client, runs the batch
//! runner on its chunk, and returns its result tagged with the chunk index.
//! After every worker has finished, results are sorted by that tag and
//! concatenated, so the output order always equals the input order.

use std::ops::Range;
use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::config::ExtractionConfig;
use crate::error::{GnerError, GnerResult};
use crate::traits::LlmConnector;

use super::batch::run_ner_on_texts;
use super::extractor::EntityExtractor;
use super::result::BatchResult;

/// Split `0..len` into `n` contiguous ranges.
///
/// Sizes differ by at most one; the first `len % n` ranges carry the extra
/// item. Ranges are empty when `n > len`.
pub fn split_chunks(len: usize, n: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let base = len / n;
    let extra = len % n;

    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// A contiguous slice of the input assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the reassembled output.
    pub index: usize,
    /// The texts, in input order.
    pub texts: Vec<String>,
}

/// Materialize the chunks for `texts`.
pub fn make_chunks<S: AsRef<str>>(texts: &[S], n: usize) -> Vec<Chunk> {
    split_chunks(texts.len(), n)
        .into_iter()
        .enumerate()
        .map(|(index, range)| Chunk {
            index,
            texts: texts[range].iter().map(|t| t.as_ref().to_string()).collect(),
        })
        .collect()
}

/// Runs extraction over a list of texts with a fixed number of workers.
pub struct ParallelDispatcher {
    connector: Arc<dyn LlmConnector>,
    config: ExtractionConfig,
    num_workers: usize,
}

impl ParallelDispatcher {
    /// Create a dispatcher. `num_workers` must be at least 1.
    pub fn new(connector: Arc<dyn LlmConnector>, num_workers: usize) -> GnerResult<Self> {
        Self::with_config(connector, num_workers, ExtractionConfig::default())
    }

    /// Create a dispatcher with explicit extraction call parameters.
    pub fn with_config(
        connector: Arc<dyn LlmConnector>,
        num_workers: usize,
        config: ExtractionConfig,
    ) -> GnerResult<Self> {
        if num_workers == 0 {
            return Err(GnerError::validation_with_suggestion(
                "num_workers must be at least 1",
                "Pass --num-processes 1 to run inline",
            ));
        }
        Ok(Self {
            connector,
            config,
            num_workers,
        })
    }

    /// Number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Extract entities for every text, preserving input order.
    ///
    /// Any worker failure aborts the whole dispatch; completed chunks are
    /// discarded.
    pub async fn run<S: AsRef<str>>(&self, texts: &[S]) -> GnerResult<BatchResult> {
        let chunks = make_chunks(texts, self.num_workers);

        if self.num_workers == 1 {
            let llm = self.connector.connect()?;
            let extractor = EntityExtractor::with_config(llm, self.config.clone());
            return run_ner_on_texts(&extractor, texts).await;
        }

        info!(
            texts = texts.len(),
            workers = self.num_workers,
            "Dispatching NER across workers"
        );

        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let connector = Arc::clone(&self.connector);
            let config = self.config.clone();
            let span = info_span!("ner_worker", chunk = chunk.index, size = chunk.texts.len());
            let index = chunk.index;

            let handle = tokio::spawn(
                async move {
                    if chunk.texts.is_empty() {
                        return Ok::<_, GnerError>((chunk.index, BatchResult::new()));
                    }
                    let llm = connector.connect()?;
                    let extractor = EntityExtractor::with_config(llm, config);
                    let batch = run_ner_on_texts(&extractor, &chunk.texts).await?;
                    Ok::<_, GnerError>((chunk.index, batch))
                }
                .instrument(span),
            );
            handles.push((index, handle));
        }

        // Barrier: wait for every worker before reassembling.
        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(index, handle)| async move { (index, handle.await) }),
        )
        .await;

        let mut tagged = Vec::with_capacity(joined.len());
        for (index, outcome) in joined {
            match outcome {
                Ok(Ok(pair)) => tagged.push(pair),
                Ok(Err(e)) => return Err(e),
                Err(join_err) => return Err(GnerError::worker(index, join_err.to_string())),
            }
        }

        tagged.sort_by_key(|(index, _)| *index);

        let mut output = BatchResult::new();
        for (_, batch) in tagged {
            output.extend(batch);
        }

        info!(
            texts = output.len(),
            failures = output.failure_count(),
            total_tokens = output.total_tokens,
            "NER dispatch complete"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_remainder_goes_first() {
        let sizes: Vec<usize> = split_chunks(10, 3).iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(split_chunks(10, 3)[1], 4..7);
    }

    #[test]
    fn test_split_more_workers_than_items() {
        let ranges = split_chunks(2, 4);
        assert_eq!(ranges, vec![0..1, 1..2, 2..2, 2..2]);
    }

    #[test]
    fn test_make_chunks() {
        let chunks = make_chunks(&["a", "b", "c"], 2);
        assert_eq!(chunks[0].texts, vec!["a", "b"]);
        assert_eq!(chunks[1].texts, vec!["c"]);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let connector: Arc<dyn LlmConnector> =
            Arc::new(|| -> GnerResult<Arc<dyn crate::traits::Llm>> {
                Err(GnerError::Internal("unused".into()))
            });
        assert!(ParallelDispatcher::new(connector, 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_chunks_partition_input(len in 0usize..500, n in 1usize..32) {
            prop_assume!(n <= len);
            let ranges = split_chunks(len, n);
            prop_assert_eq!(ranges.len(), n);

            let mut next = 0;
            for range in &ranges {
                prop_assert_eq!(range.start, next);
                next = range.end;
            }
            prop_assert_eq!(next, len);

            let max = ranges.iter().map(|r| r.len()).max().unwrap();
            let min = ranges.iter().map(|r| r.len()).min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }
}
