//! TSV cache of extraction results.
//!
//! The file has a leading unnamed index column, the record columns, and a
//! trailing `triples` column holding `{"named_entities": [...]}`.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::error::{ErrorCode, GnerError, GnerResult};
use crate::ner::BatchResult;

use super::records::{cell_text, QueryTable};

/// Column holding the serialized entity document.
pub const TRIPLES_COLUMN: &str = "triples";

/// State of the cache file relative to a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// No readable cache file.
    Missing,
    /// The cache matches the dataset and can be reused.
    Fresh { rows: usize },
    /// The cache exists but does not match the dataset.
    Stale { reason: String },
}

impl CacheStatus {
    /// Whether the cache can be reused.
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheStatus::Fresh { .. })
    }
}

/// Serialize the table plus results to TSV bytes.
pub fn render_tsv(table: &QueryTable, batch: &BatchResult) -> GnerResult<Vec<u8>> {
    if table.len() != batch.len() {
        return Err(GnerError::Internal(format!(
            "{} records but {} extraction results",
            table.len(),
            batch.len()
        )));
    }

    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(Vec::new());

    let mut header = Vec::with_capacity(table.columns.len() + 2);
    header.push(String::new());
    header.extend(table.columns.iter().cloned());
    header.push(TRIPLES_COLUMN.to_string());
    writer.write_record(&header)?;

    for (i, (row, result)) in table.rows.iter().zip(&batch.results).enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(i.to_string());
        for column in &table.columns {
            record.push(cell_text(row.get(column)));
        }
        record.push(result.to_named_entities_json());
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| GnerError::Dataset {
        message: format!("failed to flush TSV: {}", e),
        code: ErrorCode::DataWriteFailed,
    })
}

/// Write the cache file, creating its directory.
pub async fn write_cache(path: &Path, table: &QueryTable, batch: &BatchResult) -> GnerResult<()> {
    let bytes = render_tsv(table, batch)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await.map_err(|e| GnerError::Dataset {
        message: format!("failed to write {}: {}", path.display(), e),
        code: ErrorCode::DataWriteFailed,
    })
}

/// Compare a cache file's contents against the dataset.
///
/// Fresh requires the same row count, a non-empty `triples` value on every
/// row, and the cached query column equal to the dataset's queries in order.
pub fn check_cache_bytes(bytes: &[u8], table: &QueryTable) -> GnerResult<CacheStatus> {
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_reader(bytes);
    let headers = reader.headers()?.clone();

    let Some(triples_idx) = headers.iter().position(|h| h == TRIPLES_COLUMN) else {
        return Ok(CacheStatus::Stale {
            reason: "no triples column".to_string(),
        });
    };
    let query_idx = headers.iter().position(|h| h == table.query_column);

    let queries = table.queries()?;
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        if rows >= queries.len() {
            rows += 1;
            continue;
        }
        if record.get(triples_idx).map_or(true, str::is_empty) {
            return Ok(CacheStatus::Stale {
                reason: format!("row {} has no triples", rows),
            });
        }
        if let Some(idx) = query_idx {
            if record.get(idx) != Some(queries[rows].as_str()) {
                return Ok(CacheStatus::Stale {
                    reason: format!("row {} query differs from dataset", rows),
                });
            }
        }
        rows += 1;
    }

    if rows != table.len() {
        return Ok(CacheStatus::Stale {
            reason: format!("{} cached rows for {} records", rows, table.len()),
        });
    }
    if query_idx.is_none() {
        return Ok(CacheStatus::Stale {
            reason: format!("no {} column", table.query_column),
        });
    }

    Ok(CacheStatus::Fresh { rows })
}

/// Check the cache file at `path`.
///
/// An unreadable or unparsable file is reported as missing or stale, never
/// as an error.
pub async fn check_cache(path: &Path, table: &QueryTable) -> CacheStatus {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No readable NER cache");
            return CacheStatus::Missing;
        }
    };

    match check_cache_bytes(&bytes, table) {
        Ok(status) => status,
        Err(e) => CacheStatus::Stale {
            reason: format!("unreadable cache: {}", e),
        },
    }
}
