//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use parley_core::config::UpstreamConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::base::{Completion, CompletionProvider, GenerationParams, ProviderError, ProviderResult};

/// Chat completions request format
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

/// Chat completions response format
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    /// A `null` entry counts as a choice without a message
    choices: Vec<Option<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any service exposing `POST {api_base}/chat/completions`
pub struct OpenAiCompatClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl OpenAiCompatClient {
    /// Create a new client. A blank `api_key` sends no Authorization header.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        extra_headers: Option<HashMap<String, String>>,
    ) -> ProviderResult<Self> {
        let api_base = api_base.into().trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(ProviderError::ConfigError(
                "api_base must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: Client::builder()
                .http1_only()
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            extra_headers: extra_headers.unwrap_or_default(),
        })
    }

    /// Create a client from the upstream section of the configuration
    pub fn from_config(config: &UpstreamConfig) -> ProviderResult<Self> {
        Self::new(
            config.api_base.clone(),
            Some(config.api_key.clone()),
            Some(config.extra_headers.clone()),
        )
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn apply_headers(&self, mut req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }

        req_builder
    }

    /// Unwrap the first choice of a response
    fn parse_response(response: ChatCompletionResponse) -> Completion {
        let content = response
            .choices
            .into_iter()
            .next()
            .flatten()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        Completion { content }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatClient {
    async fn complete(
        &self,
        messages: Vec<Value>,
        params: &GenerationParams,
    ) -> ProviderResult<Completion> {
        let request = ChatCompletionRequest {
            model: &params.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: false,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            params.model,
            request.messages.len()
        );

        let req_builder = self.apply_headers(self.client.post(self.completions_url()).json(&request));
        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Upstream API error: {} - {}", status, body);
            return Err(ProviderError::Upstream { status, body });
        }

        let body = response.text().await?;
        let response_data: ChatCompletionResponse = serde_json::from_str(&body)?;
        Ok(Self::parse_response(response_data))
    }
}
