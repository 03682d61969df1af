use parley_providers::{CompletionProvider, GenerationParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub params: Arc<GenerationParams>,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, params: GenerationParams) -> Self {
        Self {
            provider,
            params: Arc::new(params),
        }
    }
}

/// Successful relay reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

/// Error payload for every non-200 relay response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
