//! Ollama embedding provider implementation.

use async_trait::async_trait;

use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::{
        embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
        options::GenerationOptions as OllamaOptions,
    },
    Ollama,
};

/// Ollama embedding provider.
pub struct OllamaEmbedder {
    #[cfg(feature = "ollama")]
    client: Ollama,
    #[cfg(feature = "ollama")]
    options: Option<OllamaOptions>,
    config: EmbedderConfig,
}

/// Map `model_kwargs` onto Ollama model options.
///
/// Every key must name an Ollama option (`num_ctx`, `num_thread`, ...).
#[cfg(feature = "ollama")]
fn ollama_options(config: &EmbedderConfig) -> GnerResult<Option<OllamaOptions>> {
    let Some(kwargs) = &config.model_kwargs else {
        return Ok(None);
    };

    let object: serde_json::Map<String, serde_json::Value> =
        kwargs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let options: OllamaOptions = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| GnerError::Configuration(format!("Invalid Ollama model_kwargs: {}", e)))?;

    // Keys that do not survive the round trip are not Ollama options.
    let known = serde_json::to_value(&options)?;
    if let Some(unknown) = kwargs.keys().find(|k| known.get(k.as_str()).is_none()) {
        return Err(GnerError::Configuration(format!(
            "Unsupported model_kwargs key for Ollama embeddings: {}",
            unknown
        )));
    }

    Ok(Some(options))
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> GnerResult<Self> {
        #[cfg(feature = "ollama")]
        let client = {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string());

            let url = url::Url::parse(&base_url)
                .map_err(|e| GnerError::Configuration(format!("Invalid Ollama URL: {}", e)))?;

            Ollama::new(
                format!("{}://{}", url.scheme(), url.host_str().unwrap_or("localhost")),
                url.port().unwrap_or(11434),
            )
        };

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            #[cfg(feature = "ollama")]
            options: ollama_options(&config)?,
            config,
        })
    }

    #[cfg(feature = "ollama")]
    async fn request(&self, input: EmbeddingsInput) -> GnerResult<Vec<Vec<f32>>> {
        let mut request = GenerateEmbeddingsRequest::new(self.config.model.clone(), input);
        if let Some(options) = &self.options {
            request = request.options(options.clone());
        }

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| GnerError::embedding(format!("Ollama embedding error: {}", e)))?;

        Ok(response.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[cfg(feature = "ollama")]
    async fn embed(&self, text: &str) -> GnerResult<Vec<f32>> {
        self.request(EmbeddingsInput::Single(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GnerError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "ollama"))]
    async fn embed(&self, _text: &str) -> GnerResult<Vec<f32>> {
        Err(GnerError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    #[cfg(feature = "ollama")]
    async fn embed_batch(&self, texts: &[String]) -> GnerResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(EmbeddingsInput::Multiple(texts.to_vec())).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(all(test, feature = "ollama"))]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(kwargs: serde_json::Value) -> EmbedderConfig {
        EmbedderConfig {
            model: "nomic-embed-text".to_string(),
            embedding_dims: 768,
            model_kwargs: Some(serde_json::from_value(kwargs).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_model_kwargs_become_options() {
        let embedder = OllamaEmbedder::new(config(json!({"num_ctx": 2048}))).unwrap();
        let options = serde_json::to_value(embedder.options.unwrap()).unwrap();
        assert_eq!(options["num_ctx"], 2048);
    }

    #[test]
    fn test_unknown_kwarg_rejected() {
        let err = OllamaEmbedder::new(config(json!({"trust_remote_code": true})))
            .err()
            .unwrap();
        assert!(err.to_string().contains("trust_remote_code"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = EmbedderConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            OllamaEmbedder::new(config),
            Err(GnerError::Configuration(_))
        ));
    }

    #[test]
    fn test_no_kwargs_no_options() {
        let embedder = OllamaEmbedder::new(EmbedderConfig::default()).unwrap();
        assert!(embedder.options.is_none());
    }
}
