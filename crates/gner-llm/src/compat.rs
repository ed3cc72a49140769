//! OpenAI-compatible chat endpoints over plain HTTP.
//!
//! Serves two providers: Together (remote, key required, plain-text
//! replies) and a local llama.cpp server (no key, no parameters, no usage).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gner_core::error::{GnerError, GnerResult};
use gner_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use gner_core::types::Message;

/// Together API base URL.
pub const TOGETHER_API_URL: &str = "https://api.together.xyz/v1";

/// Default address of a local `llama-server`.
pub const LLAMA_CPP_API_URL: &str = "http://localhost:8080/v1";

/// Chat client for an OpenAI-compatible server.
pub struct CompatLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
    local: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: u32,
}

impl CompatLlm {
    /// Create a Together client.
    pub fn together(config: LlmConfig) -> GnerResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("TOGETHER_API_KEY").ok())
            .ok_or_else(|| {
                GnerError::Configuration("Together API key not found. Set TOGETHER_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse()
                .map_err(|_| GnerError::Configuration("Invalid API key format".to_string()))?,
        );

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| TOGETHER_API_URL.to_string());
        Self::build(config, base_url, headers, false)
    }

    /// Create a client for a local llama.cpp server.
    pub fn llama_cpp(config: LlmConfig) -> GnerResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| LLAMA_CPP_API_URL.to_string());
        Self::build(config, base_url, reqwest::header::HeaderMap::new(), true)
    }

    fn build(
        config: LlmConfig,
        base_url: String,
        headers: reqwest::header::HeaderMap,
        local: bool,
    ) -> GnerResult<Self> {
        url::Url::parse(&base_url)
            .map_err(|e| GnerError::Configuration(format!("Invalid base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GnerError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            local,
        })
    }

    fn build_request(&self, messages: &[Message], options: Option<GenerationOptions>) -> ChatRequest {
        let messages = messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect();

        let mut request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
            stop: None,
        };

        if self.local {
            return request;
        }

        let options = options.unwrap_or_default();
        request.temperature = Some(options.temperature.unwrap_or(self.config.temperature));
        request.max_tokens = Some(options.max_tokens.unwrap_or(self.config.max_tokens));
        request.top_p = options.top_p;
        request.stop = options.stop.filter(|s| !s.is_empty());
        request
    }
}

#[async_trait]
impl Llm for CompatLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> GnerResult<LlmResponse> {
        let request = self.build_request(messages, options);
        debug!(model = %request.model, url = %self.base_url, "Sending chat completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                GnerError::network(format!("Chat completion request to {} failed", self.base_url), e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GnerError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(GnerError::from_http_status(status.as_u16(), &body));
        }

        let response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GnerError::llm(format!("Failed to parse response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GnerError::llm("No response choices returned"))?
            .message
            .content;

        // Local servers report approximate counts; callers count words instead.
        let usage = response.usage.filter(|_| !self.local).map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn is_local_model(&self) -> bool {
        self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gner_core::traits::ResponseFormat;

    fn together() -> CompatLlm {
        CompatLlm::together(LlmConfig {
            model: "meta-llama/Llama-3-8b-chat-hf".to_string(),
            api_key: Some("tg-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn extraction_options() -> GenerationOptions {
        GenerationOptions {
            temperature: Some(0.0),
            max_tokens: Some(300),
            stop: Some(vec!["\n\n".to_string()]),
            response_format: Some(ResponseFormat::Text),
            ..Default::default()
        }
    }

    #[test]
    fn test_together_request_carries_options() {
        let llm = together();
        let request = llm.build_request(
            &[Message::system("sys"), Message::user("Question: Who?\n\n")],
            Some(extraction_options()),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "meta-llama/Llama-3-8b-chat-hf");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Question: Who?\n\n");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["stop"][0], "\n\n");
        assert!(json.get("top_p").is_none());
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_llama_cpp_request_is_bare() {
        let llm = CompatLlm::llama_cpp(LlmConfig::default()).unwrap();
        let request = llm.build_request(&[Message::user("hi")], Some(extraction_options()));
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("stop").is_none());
        assert!(llm.is_local_model());
        assert!(!llm.supports_json_mode());
    }

    #[test]
    fn test_together_is_remote_text() {
        let llm = together();
        assert!(!llm.is_local_model());
        assert!(!llm.supports_json_mode());
        assert_eq!(llm.base_url, TOGETHER_API_URL);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"named_entities\": []}"}}],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.usage.unwrap().total_tokens, 7);
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some(r#"{"named_entities": []}"#)
        );
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        let llm = CompatLlm::llama_cpp(LlmConfig {
            base_url: Some("http://127.0.0.1:9/v1".to_string()),
            ..Default::default()
        })
        .unwrap();
        let result = tokio_test::block_on(llm.generate(&[Message::user("hi")], None));
        assert!(matches!(result, Err(GnerError::Network { .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = LlmConfig {
            base_url: Some("::nope".to_string()),
            ..Default::default()
        };
        assert!(CompatLlm::llama_cpp(config).is_err());
    }
}
