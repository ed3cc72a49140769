//! On-disk layout of a dataset directory.

use std::path::{Path, PathBuf};

/// Paths for one dataset under a data root.
///
/// ```text
/// <data_dir>/<dataset>/raw/train.json
/// <data_dir>/<dataset>/raw/test.json
/// <data_dir>/<dataset>/raw/dataset.json
/// <data_dir>/<dataset>/tmp/<dataset>_queries.named_entity_output.tsv
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    data_dir: PathBuf,
    dataset: String,
}

impl DatasetLayout {
    /// Create a layout for `dataset` under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, dataset: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dataset: dataset.into(),
        }
    }

    /// Dataset name.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Root of this dataset.
    pub fn root(&self) -> PathBuf {
        self.data_dir.join(&self.dataset)
    }

    /// Directory holding the input records.
    pub fn raw_dir(&self) -> PathBuf {
        self.root().join("raw")
    }

    /// Directory holding derived outputs.
    pub fn tmp_dir(&self) -> PathBuf {
        self.root().join("tmp")
    }

    /// Train and test split files, in concatenation order.
    pub fn split_files(&self) -> [PathBuf; 2] {
        let raw = self.raw_dir();
        [raw.join("train.json"), raw.join("test.json")]
    }

    /// Single-file fallback used when no split files exist.
    pub fn combined_file(&self) -> PathBuf {
        self.raw_dir().join("dataset.json")
    }

    /// TSV cache of extraction results.
    pub fn output_file(&self) -> PathBuf {
        self.tmp_dir()
            .join(format!("{}_queries.named_entity_output.tsv", self.dataset))
    }

    /// Whether the dataset keeps only the `question` field and queries
    /// through a derived `query` column (HotpotQA-style datasets).
    pub fn is_question_only(&self) -> bool {
        self.dataset.contains("hotpotqa") || matches!(self.dataset.as_str(), "custom" | "demo")
    }

    /// Data root.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
