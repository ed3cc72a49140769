//! Configuration system for gner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

use crate::error::{GnerError, GnerResult};
use crate::traits::{EmbedderConfig, EmbedderProvider, GenerationOptions, LlmConfig, ResponseFormat};

/// LLM provider type.
///
/// Parses from the names accepted on the command line: `openai`, `together`,
/// `ollama` and `llama.cpp`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAI,
    #[serde(rename = "together")]
    #[strum(serialize = "together")]
    Together,
    #[serde(rename = "ollama")]
    #[strum(serialize = "ollama")]
    Ollama,
    #[serde(rename = "llama.cpp", alias = "llamacpp")]
    #[strum(to_string = "llama.cpp", serialize = "llamacpp")]
    LlamaCpp,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key, if it needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Together => Some("TOGETHER_API_KEY"),
            LlmProvider::Ollama | LlmProvider::LlamaCpp => None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-3.5-turbo-1106".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Embedder provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

impl Default for EmbedderProviderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::OpenAI,
            config: EmbedderConfig::default(),
        }
    }
}

/// Generation parameters used for entity extraction calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Stop sequences.
    pub stop: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 300,
            stop: vec!["\n\n".to_string()],
        }
    }
}

impl ExtractionConfig {
    /// Options for a remote call, with or without native JSON mode.
    pub fn generation_options(&self, json_mode: bool) -> GenerationOptions {
        GenerationOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            stop: Some(self.stop.clone()),
            response_format: json_mode.then_some(ResponseFormat::Json),
            ..Default::default()
        }
    }
}

/// Main gner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnerConfig {
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Embedder configuration.
    pub embedder: EmbedderProviderConfig,
    /// Extraction call parameters.
    pub extraction: ExtractionConfig,
    /// Root directory holding `<dataset>/raw` and `<dataset>/tmp`.
    pub data_dir: PathBuf,
    /// Number of dispatch workers.
    pub num_workers: usize,
}

impl Default for GnerConfig {
    fn default() -> Self {
        Self {
            llm: LlmProviderConfig::default(),
            embedder: EmbedderProviderConfig::default(),
            extraction: ExtractionConfig::default(),
            data_dir: PathBuf::from("data"),
            num_workers: 1,
        }
    }
}

impl GnerConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GnerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| GnerError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| GnerError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| GnerError::Configuration(e.to_string())),
            _ => Err(GnerError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config.resolve_api_keys();
        config
    }

    /// Overlay the `GNER_*` environment variables onto this configuration.
    ///
    /// API keys are not touched; call [`GnerConfig::resolve_api_keys`] once
    /// the provider is final.
    pub fn apply_env(&mut self) {
        self.apply_env_from(env_var);
    }

    /// Overlay `GNER_*` settings read through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(llm) = lookup("GNER_LLM") {
            match llm.parse::<LlmProvider>() {
                Ok(provider) => self.llm.provider = provider,
                Err(_) => tracing::warn!("Ignoring unknown GNER_LLM value: {}", llm),
            }
        }
        if let Some(model) = lookup("GNER_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(dir) = lookup("GNER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(workers) = lookup("GNER_NUM_WORKERS") {
            match workers.parse() {
                Ok(n) => self.num_workers = n,
                Err(_) => tracing::warn!("Ignoring invalid GNER_NUM_WORKERS value: {}", workers),
            }
        }
    }

    /// Fill API keys from the environment for the selected providers.
    pub fn resolve_api_keys(&mut self) {
        self.resolve_api_keys_from(env_var);
    }

    /// Fill API keys read through `lookup` for the selected providers.
    ///
    /// The LLM key comes from the variable of the current provider, so this
    /// must run after every provider override.
    pub fn resolve_api_keys_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = self.llm.provider.api_key_var().and_then(&lookup) {
            self.llm.config.api_key = Some(api_key);
        }
        if self.embedder.provider == EmbedderProvider::OpenAI {
            if let Some(api_key) = lookup("OPENAI_API_KEY") {
                self.embedder.config.api_key = Some(api_key);
            }
        }
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> GnerConfigBuilder {
        GnerConfigBuilder::default()
    }
}

/// Builder for GnerConfig.
#[derive(Default)]
pub struct GnerConfigBuilder {
    config: GnerConfig,
}

impl GnerConfigBuilder {
    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the LLM provider and model in one step.
    pub fn llm_model(mut self, provider: LlmProvider, model: impl Into<String>) -> Self {
        self.config.llm.provider = provider;
        self.config.llm.config.model = model.into();
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set extraction parameters.
    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.config.extraction = config;
        self
    }

    /// Set the data directory.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the number of dispatch workers.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.config.num_workers = n;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GnerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_provider_from_cli_names() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("together".parse::<LlmProvider>().unwrap(), LlmProvider::Together);
        assert_eq!("Ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!("llama.cpp".parse::<LlmProvider>().unwrap(), LlmProvider::LlamaCpp);
        assert!("gemini".parse::<LlmProvider>().is_err());
        assert_eq!(LlmProvider::LlamaCpp.to_string(), "llama.cpp");
    }

    #[test]
    fn test_extraction_defaults() {
        let options = ExtractionConfig::default().generation_options(true);
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_tokens, Some(300));
        assert_eq!(options.stop, Some(vec!["\n\n".to_string()]));
        assert_eq!(options.response_format, Some(ResponseFormat::Json));

        let options = ExtractionConfig::default().generation_options(false);
        assert!(options.response_format.is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/tmp/gner"
num_workers = 4

[llm]
provider = "llama.cpp"
model = "qwen2"
"#
        )
        .unwrap();

        let config = GnerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::LlamaCpp);
        assert_eq!(config.llm.config.model, "qwen2");
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/gner"));
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = GnerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GnerError::Configuration(_)));
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_api_key_follows_final_provider() {
        let vars = [
            ("GNER_LLM", "together"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("TOGETHER_API_KEY", "tg-together"),
        ];
        let mut config = GnerConfig::default();
        config.apply_env_from(lookup(&vars));
        assert!(config.llm.config.api_key.is_none());

        config.resolve_api_keys_from(lookup(&vars));
        assert_eq!(config.llm.provider, LlmProvider::Together);
        assert_eq!(config.llm.config.api_key.as_deref(), Some("tg-together"));
        assert_eq!(config.embedder.config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn test_local_provider_gets_no_key() {
        let vars = [("OPENAI_API_KEY", "sk-openai")];
        let mut config = GnerConfig::builder()
            .llm_model(LlmProvider::Ollama, "llama3")
            .build();
        config.resolve_api_keys_from(lookup(&vars));
        assert!(config.llm.config.api_key.is_none());
    }

    #[test]
    fn test_builder() {
        let config = GnerConfig::builder()
            .llm_model(LlmProvider::Ollama, "llama3.1:8b")
            .num_workers(3)
            .data_dir("datasets")
            .build();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.config.model, "llama3.1:8b");
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.data_dir, PathBuf::from("datasets"));
    }
}
