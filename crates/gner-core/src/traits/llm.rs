//! LLM trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GnerResult;
use crate::types::Message;

/// Response from LLM generation.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Generated text content.
    pub content: Option<String>,
    /// Token usage statistics, when the backend reports them.
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    /// Create a response carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
        }
    }

    /// Attach token usage.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Get the content or an empty string.
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Usage with only a total known.
    pub fn total(total_tokens: u32) -> Self {
        Self {
            total_tokens,
            ..Default::default()
        }
    }
}

/// Configuration options for LLM generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Top-p nucleus sampling.
    pub top_p: Option<f32>,
    /// Stop sequences.
    pub stop: Option<Vec<String>>,
    /// Response format.
    pub response_format: Option<ResponseFormat>,
}

/// Response format for LLM output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Plain text response.
    Text,
    /// JSON object response.
    Json,
}

/// Core LLM trait - all LLM providers implement this.
///
/// Callers branch on the capability flags, never on the concrete provider.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Generate a response from the LLM.
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> GnerResult<LlmResponse>;

    /// Get the model name.
    fn model_name(&self) -> &str;

    /// Whether the backend natively guarantees a JSON object response.
    fn supports_json_mode(&self) -> bool {
        false
    }

    /// Whether this is a locally served model that takes no sampling,
    /// stop, or format parameters and reports no usage.
    fn is_local_model(&self) -> bool {
        false
    }
}

/// Builds a fresh LLM client.
///
/// Each dispatch worker calls [`LlmConnector::connect`] itself, so no client
/// is shared between workers.
pub trait LlmConnector: Send + Sync {
    /// Construct a new client.
    fn connect(&self) -> GnerResult<Arc<dyn Llm>>;
}

impl<F> LlmConnector for F
where
    F: Fn() -> GnerResult<Arc<dyn Llm>> + Send + Sync,
{
    fn connect(&self) -> GnerResult<Arc<dyn Llm>> {
        self()
    }
}

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/identifier.
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Top-p nucleus sampling.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_top_p() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            api_key: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoLlm;

    #[async_trait]
    impl Llm for EchoLlm {
        async fn generate(
            &self,
            messages: &[Message],
            _: Option<GenerationOptions>,
        ) -> GnerResult<LlmResponse> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(LlmResponse::text(last))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_default_capabilities() {
        let llm = EchoLlm;
        assert!(!llm.supports_json_mode());
        assert!(!llm.is_local_model());
    }

    #[tokio::test]
    async fn test_closure_connector() {
        let connector = || -> GnerResult<Arc<dyn Llm>> { Ok(Arc::new(EchoLlm)) };
        let llm = connector.connect().unwrap();
        let response = llm.generate(&[Message::user("ping")], None).await.unwrap();
        assert_eq!(response.content_or_empty(), "ping");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_llm_config_deserialize_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{"model": "gpt-4o-mini"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 2000);
        assert!(config.api_key.is_none());
    }
}
