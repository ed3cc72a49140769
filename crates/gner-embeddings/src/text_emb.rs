//! Text embedding model over any [`Embedder`].
//!
//! Mirrors a sentence-embedding encoder: an optional instruction is
//! prepended to every text (one for queries, one for passages), texts are
//! embedded in fixed-size batches, and vectors are optionally scaled to unit
//! length.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use gner_core::config::EmbedderProviderConfig;
use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::Embedder;

use crate::factory::EmbedderFactory;

/// Options for [`TextEmbModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextEmbOptions {
    /// Scale each embedding to unit L2 norm.
    pub normalize: bool,
    /// Texts per provider call.
    pub batch_size: usize,
    /// Prefix for query texts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_instruct: Option<String>,
    /// Prefix for passage texts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_instruct: Option<String>,
    /// Provider model options, applied when the model builds its provider
    /// (see [`TextEmbModel::from_config`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_kwargs: Option<HashMap<String, Value>>,
}

impl Default for TextEmbOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            batch_size: 32,
            query_instruct: None,
            passage_instruct: None,
            model_kwargs: None,
        }
    }
}

/// Scale `v` to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Embedding model used to encode queries and passages.
pub struct TextEmbModel {
    embedder: Arc<dyn Embedder>,
    options: TextEmbOptions,
}

impl TextEmbModel {
    /// Wrap an already built embedder.
    ///
    /// `model_kwargs` cannot reach a provider that already exists, so they
    /// are rejected here.
    pub fn new(embedder: Arc<dyn Embedder>, options: TextEmbOptions) -> GnerResult<Self> {
        if options.model_kwargs.is_some() {
            return Err(GnerError::validation_with_suggestion(
                "model_kwargs cannot be applied to a prebuilt embedder",
                "Build the model with TextEmbModel::from_config instead",
            ));
        }
        Ok(Self { embedder, options })
    }

    /// Build the provider from `config` and wrap it.
    ///
    /// `options.model_kwargs` are merged over the provider's own
    /// `model_kwargs`; the provider rejects keys it does not support.
    pub fn from_config(
        config: &EmbedderProviderConfig,
        options: TextEmbOptions,
    ) -> GnerResult<Self> {
        let mut config = config.clone();
        if let Some(kwargs) = &options.model_kwargs {
            config
                .config
                .model_kwargs
                .get_or_insert_with(HashMap::new)
                .extend(kwargs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let embedder = EmbedderFactory::from_config(&config)?;
        info!(model = embedder.model_name(), "Loaded embedding model");
        Ok(Self { embedder, options })
    }

    /// Model options.
    pub fn options(&self) -> &TextEmbOptions {
        &self.options
    }

    /// Underlying model name.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embedding dimension reported by the provider.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    fn instruction(&self, is_query: bool) -> Option<&str> {
        if is_query {
            self.options.query_instruct.as_deref()
        } else {
            self.options.passage_instruct.as_deref()
        }
    }

    /// Encode `texts`, one vector per text in input order.
    ///
    /// With `show_progress`, each finished batch is logged at `info`;
    /// otherwise at `debug`.
    pub async fn encode(
        &self,
        texts: &[String],
        is_query: bool,
        show_progress: bool,
    ) -> GnerResult<Vec<Vec<f32>>> {
        if self.options.batch_size == 0 {
            return Err(GnerError::validation("batch_size must be at least 1"));
        }

        let prompt = self.instruction(is_query);
        let inputs: Vec<String> = match prompt {
            Some(prefix) => texts.iter().map(|t| format!("{}{}", prefix, t)).collect(),
            None => texts.to_vec(),
        };

        let batches = inputs.len().div_ceil(self.options.batch_size);
        let mut embeddings = Vec::with_capacity(inputs.len());

        for (i, batch) in inputs.chunks(self.options.batch_size).enumerate() {
            let vectors = self.embedder.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(GnerError::embedding(format!(
                    "{} returned {} embeddings for {} texts",
                    self.embedder.model_name(),
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);

            if show_progress {
                info!(batch = i + 1, of = batches, "Encoding");
            } else {
                debug!(batch = i + 1, of = batches, "Encoding");
            }
        }

        if self.options.normalize {
            embeddings.iter_mut().for_each(|v| l2_normalize(v));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds a text as `[len, 0]` and records every batch it receives.
    struct LengthEmbedder {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl LengthEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> GnerResult<Vec<f32>> {
            Ok(vec![text.len() as f32, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> GnerResult<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.to_vec());
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_instructions_prefix_texts() {
        let embedder = LengthEmbedder::new();
        let model = TextEmbModel::new(
            embedder.clone(),
            TextEmbOptions {
                query_instruct: Some("query: ".to_string()),
                passage_instruct: Some("passage: ".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        model.encode(&texts(&["a"]), true, false).await.unwrap();
        model.encode(&texts(&["b"]), false, false).await.unwrap();

        let batches = embedder.batches.lock().unwrap();
        assert_eq!(batches[0], vec!["query: a"]);
        assert_eq!(batches[1], vec!["passage: b"]);
    }

    #[tokio::test]
    async fn test_batches_by_batch_size() {
        let embedder = LengthEmbedder::new();
        let model = TextEmbModel::new(
            embedder.clone(),
            TextEmbOptions {
                batch_size: 2,
                ..Default::default()
            },
        )
        .unwrap();

        let out = model
            .encode(&texts(&["a", "bb", "ccc", "dddd", "eeeee"]), true, true)
            .await
            .unwrap();

        let sizes: Vec<usize> = embedder.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let lengths: Vec<f32> = out.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn test_normalize() {
        let model = TextEmbModel::new(
            LengthEmbedder::new(),
            TextEmbOptions {
                normalize: true,
                ..Default::default()
            },
        )
        .unwrap();
        let out = model.encode(&texts(&["abc"]), false, false).await.unwrap();
        assert_eq!(out[0], vec![1.0, 0.0]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let model = TextEmbModel::new(
            LengthEmbedder::new(),
            TextEmbOptions {
                batch_size: 0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(tokio_test::block_on(model.encode(&texts(&["a"]), true, false)).is_err());
    }

    #[test]
    fn test_prebuilt_embedder_rejects_model_kwargs() {
        let options: TextEmbOptions =
            serde_json::from_str(r#"{"model_kwargs": {"num_ctx": 2048}}"#).unwrap();
        let err = TextEmbModel::new(LengthEmbedder::new(), options).err().unwrap();
        assert!(err.to_string().contains("prebuilt embedder"));
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_from_config_passes_model_kwargs_to_provider() {
        use gner_core::traits::{EmbedderConfig, EmbedderProvider};

        let config = EmbedderProviderConfig {
            provider: EmbedderProvider::Ollama,
            config: EmbedderConfig {
                model: "nomic-embed-text".to_string(),
                embedding_dims: 768,
                ..Default::default()
            },
        };

        let accepted: TextEmbOptions =
            serde_json::from_str(r#"{"model_kwargs": {"num_ctx": 2048}}"#).unwrap();
        let model = TextEmbModel::from_config(&config, accepted).unwrap();
        assert_eq!(model.model_name(), "nomic-embed-text");

        let rejected: TextEmbOptions =
            serde_json::from_str(r#"{"model_kwargs": {"torch_dtype": "float16"}}"#).unwrap();
        let err = TextEmbModel::from_config(&config, rejected).err().unwrap();
        assert!(err.to_string().contains("torch_dtype"));
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_options_from_json() {
        let options: TextEmbOptions = serde_json::from_str(
            r#"{"normalize": true, "query_instruct": "q: ", "model_kwargs": {"torch_dtype": "float16"}}"#,
        )
        .unwrap();
        assert!(options.normalize);
        assert_eq!(options.batch_size, 32);
        assert_eq!(
            options.model_kwargs.unwrap()["torch_dtype"],
            Value::from("float16")
        );
    }
}
