//! End-to-end query NER over a dataset directory.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::GnerConfig;
use crate::error::GnerResult;
use crate::ner::ParallelDispatcher;
use crate::traits::LlmConnector;

use super::cache::{check_cache, write_cache, CacheStatus};
use super::layout::DatasetLayout;
use super::records::load_query_table;

/// Price used for the cost estimate in the run summary.
pub const USD_PER_1K_TOKENS: f64 = 0.002;

/// Result of a driver run.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    /// Entities were extracted and the cache written.
    Computed { rows: usize, total_tokens: u64 },
    /// A fresh cache already existed.
    Cached { rows: usize },
    /// The run failed; downstream retrieval has no query entities.
    Failed { reason: String },
}

/// Loads a dataset, reuses or rebuilds the NER cache.
pub struct QueryNerDriver {
    layout: DatasetLayout,
    dispatcher: ParallelDispatcher,
}

impl QueryNerDriver {
    /// Create a driver for `dataset` using the config's data root, worker
    /// count and extraction parameters.
    pub fn new(
        config: &GnerConfig,
        dataset: impl Into<String>,
        connector: Arc<dyn LlmConnector>,
    ) -> GnerResult<Self> {
        let layout = DatasetLayout::new(config.data_dir.clone(), dataset);
        let dispatcher =
            ParallelDispatcher::with_config(connector, config.num_workers, config.extraction.clone())?;
        Ok(Self { layout, dispatcher })
    }

    /// Create a driver from parts.
    pub fn from_parts(layout: DatasetLayout, dispatcher: ParallelDispatcher) -> Self {
        Self { layout, dispatcher }
    }

    /// Dataset layout.
    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Run the driver. Failures are logged and reported in the outcome,
    /// never returned as errors.
    pub async fn run(&self) -> DriverOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    dataset = self.layout.dataset(),
                    error = %e,
                    "No queries will be processed for later retrieval."
                );
                DriverOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_run(&self) -> GnerResult<DriverOutcome> {
        let table = load_query_table(&self.layout).await?;
        let output_file = self.layout.output_file();

        match check_cache(&output_file, &table).await {
            CacheStatus::Fresh { rows } => {
                info!(path = %output_file.display(), rows, "Query NER already saved");
                return Ok(DriverOutcome::Cached { rows });
            }
            CacheStatus::Stale { reason } => {
                warn!(path = %output_file.display(), reason = %reason, "Recomputing stale query NER cache");
            }
            CacheStatus::Missing => {}
        }

        let queries = table.queries()?;
        let batch = self.dispatcher.run(&queries).await?;

        write_cache(&output_file, &table, &batch).await?;
        info!(
            path = %output_file.display(),
            rows = batch.len(),
            total_tokens = batch.total_tokens,
            estimated_cost_usd = batch.estimated_cost(USD_PER_1K_TOKENS),
            "Query NER saved"
        );

        Ok(DriverOutcome::Computed {
            rows: batch.len(),
            total_tokens: batch.total_tokens,
        })
    }
}
