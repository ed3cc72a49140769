//! Error types for gner operations.
//!
//! Errors carry a structured [`ErrorCode`] for programmatic handling and an
//! optional suggestion for resolution. Recoverable per-item parse failures are
//! not errors; they are reported as [`crate::ner::ExtractionFailure`].

use thiserror::Error;

/// Result type alias for gner operations.
pub type GnerResult<T> = Result<T, GnerError>;

/// Main error type for all gner operations.
#[derive(Error, Debug)]
pub enum GnerError {
    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        code: ErrorCode,
        retry_after: Option<u64>,
    },

    /// LLM operation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Dataset or cache file could not be read or written.
    #[error("Dataset error: {message}")]
    Dataset { message: String, code: ErrorCode },

    /// A dispatch worker failed or panicked.
    #[error("Worker {chunk} failed: {message}")]
    Worker { chunk: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TSV read/write error.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (AUTH_xxx)
    AuthInvalidKey,

    // Validation (VAL_xxx)
    ValInvalidInput,

    // Rate Limit (RATE_xxx)
    RateLimitExceeded,

    // LLM (LLM_xxx)
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Embedding (EMB_xxx)
    EmbGenerationFailed,

    // Dataset (DATA_xxx)
    DataNotFound,
    DataMalformed,
    DataWriteFailed,

    // Network (NET_xxx)
    NetConnectionFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthInvalidKey => "AUTH_001",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::RateLimitExceeded => "RATE_001",
            ErrorCode::LlmGenerationFailed => "LLM_001",
            ErrorCode::LlmInvalidResponse => "LLM_002",
            ErrorCode::EmbGenerationFailed => "EMB_001",
            ErrorCode::DataNotFound => "DATA_001",
            ErrorCode::DataMalformed => "DATA_002",
            ErrorCode::DataWriteFailed => "DATA_003",
            ErrorCode::NetConnectionFailed => "NET_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl GnerError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create a dataset error for a missing input file.
    pub fn dataset_not_found(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
            code: ErrorCode::DataNotFound,
        }
    }

    /// Create a dataset error for malformed records.
    pub fn dataset_malformed(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
            code: ErrorCode::DataMalformed,
        }
    }

    /// Create a worker failure error.
    pub fn worker(chunk: usize, message: impl Into<String>) -> Self {
        Self::Worker {
            chunk,
            message: message.into(),
        }
    }

    /// Create a network error for a request that never got a response.
    pub fn network(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::RateLimit { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::Dataset { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Io(_) => ErrorCode::DataNotFound,
            Self::Csv(_) => ErrorCode::DataMalformed,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Authentication { .. } => {
                Some("Please check your API key and authentication credentials")
            }
            Self::RateLimit { .. } => Some("Please wait before making more requests"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::Dataset { .. } => Some("Please check the dataset directory layout"),
            Self::Network { .. } => Some("Please check that the provider endpoint is reachable"),
            _ => None,
        }
    }

    /// Convert from an HTTP status code returned by a provider.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 => Self::Validation {
                message: body.to_string(),
                code: ErrorCode::ValInvalidInput,
                suggestion: Some("Please check your request parameters".to_string()),
            },
            401 | 403 => Self::Authentication {
                message: body.to_string(),
                code: ErrorCode::AuthInvalidKey,
                source: None,
            },
            429 => Self::RateLimit {
                message: body.to_string(),
                code: ErrorCode::RateLimitExceeded,
                retry_after: None,
            },
            _ => Self::Llm {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::LlmInvalidResponse,
                source: None,
            },
        }
    }
}
