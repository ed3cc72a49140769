//! Loading question records from JSON.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::error::{GnerError, GnerResult};

use super::layout::DatasetLayout;

/// Column holding the question text in every supported dataset.
pub const QUESTION_COLUMN: &str = "question";

/// Derived query column of question-only datasets.
pub const QUERY_COLUMN: &str = "query";

/// Question records plus the column layout they are written with.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTable {
    /// Column names, in output order.
    pub columns: Vec<String>,
    /// One object per record.
    pub rows: Vec<Map<String, Value>>,
    /// Column whose values are sent to the extractor.
    pub query_column: String,
}

impl QueryTable {
    /// Build the table from raw records.
    ///
    /// Question-only datasets keep just `question` and copy it into the
    /// `0` and `query` columns; other datasets keep every field and query
    /// on `question`.
    pub fn from_records(records: Vec<Map<String, Value>>, question_only: bool) -> GnerResult<Self> {
        if question_only {
            let mut rows = Vec::with_capacity(records.len());
            for (i, record) in records.into_iter().enumerate() {
                let question = record.get(QUESTION_COLUMN).cloned().ok_or_else(|| {
                    GnerError::dataset_malformed(format!("record {} has no question field", i))
                })?;
                let mut row = Map::new();
                row.insert(QUESTION_COLUMN.to_string(), question.clone());
                row.insert("0".to_string(), question.clone());
                row.insert(QUERY_COLUMN.to_string(), question);
                rows.push(row);
            }
            return Ok(Self {
                columns: vec![
                    QUESTION_COLUMN.to_string(),
                    "0".to_string(),
                    QUERY_COLUMN.to_string(),
                ],
                rows,
                query_column: QUERY_COLUMN.to_string(),
            });
        }

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        Ok(Self {
            columns,
            rows: records,
            query_column: QUESTION_COLUMN.to_string(),
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Query strings in record order.
    pub fn queries(&self) -> GnerResult<Vec<String>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row.get(&self.query_column) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Null) | None => Err(GnerError::dataset_malformed(format!(
                    "record {} has no {} value",
                    i, self.query_column
                ))),
                Some(other) => Ok(other.to_string()),
            })
            .collect()
    }
}

/// Render a cell the way it is written to the TSV cache.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Read one JSON file holding an array of record objects.
pub async fn read_records(path: &Path) -> GnerResult<Vec<Map<String, Value>>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        GnerError::dataset_not_found(format!("failed to read {}: {}", path.display(), e))
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        GnerError::dataset_malformed(format!("{} is not valid JSON: {}", path.display(), e))
    })?;

    let Value::Array(items) = value else {
        return Err(GnerError::dataset_malformed(format!(
            "{} must hold a JSON array of records",
            path.display()
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(GnerError::dataset_malformed(format!(
                "{}: record {} is not an object",
                path.display(),
                i
            ))),
        })
        .collect()
}

/// Load the dataset's question table.
///
/// Existing split files (`train.json`, then `test.json`) are concatenated;
/// when neither exists, `dataset.json` is read instead.
pub async fn load_query_table(layout: &DatasetLayout) -> GnerResult<QueryTable> {
    let mut sources = Vec::new();
    for path in layout.split_files() {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            sources.push(path);
        }
    }
    if sources.is_empty() {
        sources.push(layout.combined_file());
    }

    let mut records = Vec::new();
    for path in &sources {
        let batch = read_records(path).await?;
        debug!(path = %path.display(), records = batch.len(), "Loaded dataset records");
        records.extend(batch);
    }

    QueryTable::from_records(records, layout.is_question_only())
}
