use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use mockito::Matcher;
use parley_providers::{
    Completion, CompletionProvider, GenerationParams, OpenAiCompatClient, ProviderError,
    ProviderResult,
};
use parley_server::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct StubProvider {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(
        &self,
        _messages: Vec<Value>,
        _params: &GenerationParams,
    ) -> ProviderResult<Completion> {
        Ok(Completion {
            content: self.content.clone(),
        })
    }
}

struct BrokenProvider;

#[async_trait]
impl CompletionProvider for BrokenProvider {
    async fn complete(
        &self,
        _messages: Vec<Value>,
        _params: &GenerationParams,
    ) -> ProviderResult<Completion> {
        Err(ProviderError::JsonError(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        ))
    }
}

fn router_with(provider: Arc<dyn CompletionProvider>) -> axum::Router {
    build_router(AppState::new(provider, GenerationParams::default()), true)
}

fn upstream_router(server: &mockito::ServerGuard) -> axum::Router {
    let client = OpenAiCompatClient::new(server.url(), Some("gsk-test".to_string()), None).unwrap();
    router_with(Arc::new(client))
}

async fn post_chat(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn empty_message_list_is_rejected() {
    let app = router_with(Arc::new(StubProvider { content: None }));

    let (status, body) = post_chat(app, r#"{"messages":[]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_message_list_is_rejected() {
    let app = router_with(Arc::new(StubProvider { content: None }));

    let (status, body) = post_chat(app, r#"{"message":"hi"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_body_is_an_internal_error() {
    let app = router_with(Arc::new(StubProvider { content: None }));

    let (status, body) = post_chat(app, "{ not json").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn null_body_is_an_internal_error() {
    let app = router_with(Arc::new(StubProvider { content: None }));

    let (status, body) = post_chat(app, "null").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn unusual_messages_are_left_to_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "messages": [
                { "role": "tool", "content": "x" },
                { "role": "user", "content": 42 },
                { "role": "user" }
            ]
        })))
        .with_status(400)
        .with_body(r#"{"error":{"message":"'messages.0.role' is invalid"}}"#)
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"tool","content":"x"},{"role":"user","content":42},{"role":"user","extra":true}]}"#,
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Upstream API error: 400"));
    assert!(error.contains("messages.0.role"));
}

#[tokio::test]
async fn null_choice_falls_back_to_apology() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[null]}"#)
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "I apologize, but I couldn't generate a response."
    );
}

#[tokio::test]
async fn upstream_reply_is_trimmed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer gsk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"  hello there  "}}]}"#)
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "message": "hello there" }));
}

#[tokio::test]
async fn upstream_failure_status_is_propagated() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("500"));
    assert!(error.contains("upstream exploded"));
}

#[tokio::test]
async fn upstream_unauthorized_keeps_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Invalid API Key"));
}

#[tokio::test]
async fn missing_content_falls_back_to_apology() {
    let app = router_with(Arc::new(StubProvider { content: None }));

    let (status, body) = post_chat(app, r#"{"messages":[{"role":"user","content":"hi"}]}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "I apologize, but I couldn't generate a response."
    );
}

#[tokio::test]
async fn empty_choices_fall_back_to_apology() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let (status, body) = post_chat(
        upstream_router(&server),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "I apologize, but I couldn't generate a response."
    );
}

#[tokio::test]
async fn provider_failure_hides_details() {
    let app = router_with(Arc::new(BrokenProvider));

    let (status, body) = post_chat(app, r#"{"messages":[{"role":"user","content":"hi"}]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn status_route_reports_running() {
    let app = router_with(Arc::new(StubProvider { content: None }));
    let request = Request::builder()
        .uri("/api/status")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
