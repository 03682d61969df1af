use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use parley_providers::ProviderError;
use serde_json::{Map, Value};

use crate::state::{AppState, ChatResponse, ErrorBody, StatusResponse};

/// Reply used when the upstream service returns no content
pub const FALLBACK_REPLY: &str = "I apologize, but I couldn't generate a response.";

const MISSING_MESSAGES: &str = "Messages array is required and must not be empty";
const INTERNAL_ERROR: &str = "Internal server error";

type ErrorResponse = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, error: impl Into<String>) -> ErrorResponse {
    (status, Json(ErrorBody::new(error)))
}

fn internal_error(reason: &str) -> ErrorResponse {
    tracing::error!("Chat API error: {}", reason);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}

/// Keep only `role` and `content`. Absent fields stay absent; the upstream
/// service judges the values.
fn project_message(item: Value) -> Result<Value, ErrorResponse> {
    let mut projected = Map::new();
    match item {
        Value::Null => return Err(internal_error("null message element")),
        Value::Object(mut fields) => {
            for key in ["role", "content"] {
                if let Some(value) = fields.remove(key) {
                    projected.insert(key.to_string(), value);
                }
            }
        }
        _ => {}
    }
    Ok(Value::Object(projected))
}

/// Extract the message list. Only a missing, non-array or empty list is a
/// client error.
fn parse_messages(payload: Value) -> Result<Vec<Value>, ErrorResponse> {
    let messages = match payload {
        Value::Null => return Err(internal_error("request body is null")),
        Value::Object(mut map) => map.remove("messages"),
        _ => None,
    };
    let messages = match messages {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGES)),
    };

    messages.into_iter().map(project_message).collect()
}

/// `POST /api/chat`: forward the history upstream and return the trimmed reply
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ErrorResponse> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| internal_error(&format!("invalid request body: {}", e)))?;
    let messages = parse_messages(payload)?;

    tracing::info!("Relaying {} messages upstream", messages.len());

    match state.provider.complete(messages, &state.params).await {
        Ok(completion) => {
            let content = completion
                .content
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| FALLBACK_REPLY.to_string());
            Ok(Json(ChatResponse {
                message: content.trim().to_string(),
            }))
        }
        Err(err @ ProviderError::Upstream { status, .. }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Err(error_response(status, err.to_string()))
        }
        Err(e) => Err(internal_error(&e.to_string())),
    }
}

/// `GET /api/status`
pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
    })
}
