//! Ollama LLM provider implementation.
//!
//! Local models are called with the prompt alone: no sampling parameters,
//! stop sequences or response format, and no usage reporting.

use async_trait::async_trait;

use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use gner_core::types::Message;

#[cfg(feature = "ollama")]
use gner_core::types::MessageRole;
#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage, MessageRole as OllamaRole},
    Ollama,
};

/// Server used when no base URL is configured.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama LLM provider.
pub struct OllamaLlm {
    #[cfg(feature = "ollama")]
    client: Ollama,
    config: LlmConfig,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider.
    pub fn new(config: LlmConfig) -> GnerResult<Self> {
        #[cfg(feature = "ollama")]
        let client = {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

            let url = url::Url::parse(&base_url)
                .map_err(|e| GnerError::Configuration(format!("Invalid Ollama URL: {}", e)))?;

            Ollama::new(
                format!("{}://{}", url.scheme(), url.host_str().unwrap_or("localhost")),
                url.port().unwrap_or(11434),
            )
        };

        let mut config = config;
        if config.model.is_empty() {
            config.model = "llama3".to_string();
        }

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            config,
        })
    }

    #[cfg(feature = "ollama")]
    fn message_to_ollama(msg: &Message) -> ChatMessage {
        let role = match msg.role {
            MessageRole::System => OllamaRole::System,
            MessageRole::User => OllamaRole::User,
            MessageRole::Assistant => OllamaRole::Assistant,
        };
        ChatMessage::new(role, msg.content.clone())
    }
}

#[async_trait]
impl Llm for OllamaLlm {
    #[cfg(feature = "ollama")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> GnerResult<LlmResponse> {
        if options.is_some() {
            tracing::debug!(model = %self.config.model, "Ignoring generation options for local model");
        }

        let ollama_messages: Vec<ChatMessage> =
            messages.iter().map(Self::message_to_ollama).collect();
        let request = ChatMessageRequest::new(self.config.model.clone(), ollama_messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| GnerError::llm(format!("Ollama API error: {}", e)))?;

        let content = response.message.map(|m| m.content);

        Ok(LlmResponse {
            content,
            usage: None,
        })
    }

    #[cfg(not(feature = "ollama"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> GnerResult<LlmResponse> {
        Err(GnerError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn is_local_model(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let llm = OllamaLlm::new(LlmConfig::default()).unwrap();
        assert!(llm.is_local_model());
        assert!(!llm.supports_json_mode());
        assert_eq!(llm.model_name(), "llama3");
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_invalid_url_rejected() {
        let config = LlmConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            OllamaLlm::new(config),
            Err(GnerError::Configuration(_))
        ));
    }
}
