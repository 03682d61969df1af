use async_trait::async_trait;
use parley_core::{Error, RelayClient, WireMessage};
use reqwest::Client;
use serde_json::Value;

const NO_REPLY: &str = "Sorry, there was an error processing the response.";
const NO_ERROR_TEXT: &str = "Failed to get response";

/// Talks to a parley relay over HTTP
pub struct HttpRelayClient {
    client: Client,
    relay_url: String,
}

impl HttpRelayClient {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
        }
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn relay(&self, messages: Vec<WireMessage>) -> parley_core::Result<String> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await
            .map_err(|e| Error::Relay(e.to_string()))?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let error = non_empty_str(&body, "error").unwrap_or(NO_ERROR_TEXT);
            return Err(Error::Relay(error.to_string()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Relay(e.to_string()))?;
        Ok(non_empty_str(&body, "message").unwrap_or(NO_REPLY).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use parley_core::Role;

    fn history() -> Vec<WireMessage> {
        vec![WireMessage::new(Role::User, "hi")]
    }

    #[tokio::test]
    async fn test_relay_returns_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Json(serde_json::json!({
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .with_status(200)
            .with_body(r#"{"message":"hello there"}"#)
            .create_async()
            .await;

        let client = HttpRelayClient::new(format!("{}/api/chat", server.url()));
        let reply = client.relay(history()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "hello there");
    }

    #[tokio::test]
    async fn test_relay_missing_message_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = HttpRelayClient::new(format!("{}/api/chat", server.url()));
        let reply = client.relay(history()).await.unwrap();

        assert_eq!(reply, NO_REPLY);
    }

    #[tokio::test]
    async fn test_relay_surfaces_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body(r#"{"error":"Internal server error"}"#)
            .create_async()
            .await;

        let client = HttpRelayClient::new(format!("{}/api/chat", server.url()));
        let err = client.relay(history()).await.unwrap_err();

        assert_eq!(err.to_string(), "Internal server error");
    }

    #[tokio::test]
    async fn test_relay_error_without_body_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = HttpRelayClient::new(format!("{}/api/chat", server.url()));
        let err = client.relay(history()).await.unwrap_err();

        assert_eq!(err.to_string(), NO_ERROR_TEXT);
    }
}
