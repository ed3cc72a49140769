//! OpenAI embedding provider implementation.

use async_trait::async_trait;

use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// Request options taken from `model_kwargs`.
#[derive(Debug, Clone, Default, PartialEq)]
struct RequestOptions {
    dimensions: Option<u32>,
    user: Option<String>,
}

impl RequestOptions {
    /// Accepts `dimensions` (positive integer) and `user` (string).
    fn from_config(config: &EmbedderConfig) -> GnerResult<Self> {
        let mut options = Self::default();
        let Some(kwargs) = &config.model_kwargs else {
            return Ok(options);
        };

        for (key, value) in kwargs {
            match key.as_str() {
                "dimensions" => {
                    let dims = value
                        .as_u64()
                        .filter(|d| *d > 0)
                        .and_then(|d| u32::try_from(d).ok())
                        .ok_or_else(|| {
                            GnerError::Configuration(format!(
                                "model_kwargs.dimensions must be a positive integer, got {}",
                                value
                            ))
                        })?;
                    options.dimensions = Some(dims);
                }
                "user" => {
                    let user = value.as_str().ok_or_else(|| {
                        GnerError::Configuration(format!(
                            "model_kwargs.user must be a string, got {}",
                            value
                        ))
                    })?;
                    options.user = Some(user.to_string());
                }
                other => {
                    return Err(GnerError::Configuration(format!(
                        "Unsupported model_kwargs key for OpenAI embeddings: {}",
                        other
                    )))
                }
            }
        }
        Ok(options)
    }
}

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
    options: RequestOptions,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: EmbedderConfig) -> GnerResult<Self> {
        let options = RequestOptions::from_config(&config)?;

        #[cfg(feature = "openai")]
        let client = {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    GnerError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
                })?;

            let openai_config = if let Some(ref base_url) = config.base_url {
                OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(base_url)
            } else {
                OpenAIConfig::new().with_api_key(api_key)
            };
            Client::with_config(openai_config)
        };

        let mut config = config;
        if let Some(dims) = options.dimensions {
            config.embedding_dims = dims as usize;
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
            options,
        })
    }

    #[cfg(feature = "openai")]
    async fn request(&self, input: EmbeddingInput) -> GnerResult<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input,
            dimensions: self.options.dimensions,
            user: self.options.user.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| GnerError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> GnerResult<Vec<f32>> {
        self.request(EmbeddingInput::String(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GnerError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> GnerResult<Vec<f32>> {
        Err(GnerError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(&self, texts: &[String]) -> GnerResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .request(EmbeddingInput::StringArray(texts.to_vec()))
            .await?;
        if embeddings.len() != texts.len() {
            return Err(GnerError::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
