//! Base trait for upstream completion providers

use async_trait::async_trait;
use parley_core::config::UpstreamConfig;
use serde_json::Value;
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The upstream service answered with a non-success status
    #[error("Upstream API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Generation parameters sent with every completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}

/// Unwrapped reply from the upstream service
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// Content of the first choice, if the service returned any
    pub content: Option<String>,
}

/// Trait for upstream completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a non-streaming chat completion request.
    ///
    /// `messages` go upstream as given; the service validates them.
    async fn complete(
        &self,
        messages: Vec<Value>,
        params: &GenerationParams,
    ) -> ProviderResult<Completion>;
}
