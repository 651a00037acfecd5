//! Integration tests for the Gemini provider against a local stub server

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use base64::Engine;
use mediscript_domain::{ImagePayload, VisionProvider, VisionRequest};
use mediscript_llm::{GeminiProvider, LlmError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the stub
#[derive(Debug, Clone)]
struct Seen {
    path: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Stub {
    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn handle(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    stub.seen.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    stub.replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "no reply scripted".to_string()))
}

/// Start a stub server that answers with the scripted replies in order
async fn spawn_stub(replies: Vec<(StatusCode, String)>) -> anyhow::Result<(String, Stub)> {
    let stub = Stub::default();
    stub.replies.lock().unwrap().extend(replies);

    let app = Router::new().fallback(handle).with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((format!("http://{}", addr), stub))
}

fn provider(endpoint: &str) -> GeminiProvider {
    GeminiProvider::new("test-key", "gemini-2.5-flash")
        .unwrap()
        .with_endpoint(endpoint)
        .with_backoff_base(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(5))
}

fn request() -> VisionRequest {
    let bytes = b"\x89PNG\r\n\x1a\nfake";
    VisionRequest {
        image: ImagePayload::new(
            "image/png",
            base64::engine::general_purpose::STANDARD.encode(bytes),
            bytes.len(),
        ),
        instruction: "Extract the medical information from this image according to the schema."
            .to_string(),
        system_instruction: "You are an advanced medical OCR assistant.".to_string(),
        response_schema: json!({"type": "OBJECT", "properties": {"age": {"type": "STRING"}}}),
        response_mime_type: "application/json".to_string(),
        temperature: 0.1,
    }
}

fn candidate(text: &str) -> String {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]
    })
    .to_string()
}

#[tokio::test]
async fn test_successful_generate_content() -> anyhow::Result<()> {
    let (endpoint, stub) = spawn_stub(vec![(StatusCode::OK, candidate(r#"{"age":"34 years"}"#))]).await?;

    let text = provider(&endpoint).generate(&request()).await?;
    assert_eq!(text, r#"{"age":"34 years"}"#);

    let seen = stub.last();
    assert_eq!(seen.path, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));
    assert_eq!(seen.body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(seen.body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(seen.body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    Ok(())
}

#[tokio::test]
async fn test_retries_server_errors() -> anyhow::Result<()> {
    let (endpoint, stub) = spawn_stub(vec![
        (StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string()),
        (StatusCode::OK, candidate("{}")),
    ])
    .await?;

    let text = provider(&endpoint).generate(&request()).await?;
    assert_eq!(text, "{}");
    assert_eq!(stub.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries() -> anyhow::Result<()> {
    let (endpoint, stub) = spawn_stub(vec![
        (StatusCode::TOO_MANY_REQUESTS, "{}".to_string()),
        (StatusCode::TOO_MANY_REQUESTS, "{}".to_string()),
    ])
    .await?;

    let result = provider(&endpoint)
        .with_max_retries(2)
        .generate(&request())
        .await;
    assert_eq!(result, Err(LlmError::RateLimitExceeded));
    assert_eq!(stub.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_invalid_key_is_not_retried() -> anyhow::Result<()> {
    let body = json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}});
    let (endpoint, stub) = spawn_stub(vec![(StatusCode::BAD_REQUEST, body.to_string())]).await?;

    let result = provider(&endpoint).generate(&request()).await;
    assert!(matches!(result, Err(LlmError::Unauthorized(_))));
    assert_eq!(stub.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_other_client_errors_are_not_retried() -> anyhow::Result<()> {
    let too_big = json!({"error": {"message": "too big"}}).to_string();
    let (endpoint, stub) = spawn_stub(vec![
        (StatusCode::PAYLOAD_TOO_LARGE, too_big.clone()),
        (StatusCode::PAYLOAD_TOO_LARGE, too_big.clone()),
        (StatusCode::PAYLOAD_TOO_LARGE, too_big),
    ])
    .await?;

    let result = provider(&endpoint).generate(&request()).await;
    assert_eq!(result, Err(LlmError::InvalidRequest("HTTP 413: too big".to_string())));
    assert_eq!(stub.calls(), 1);

    let (endpoint, stub) =
        spawn_stub(vec![(StatusCode::UNPROCESSABLE_ENTITY, "{}".to_string())]).await?;
    let result = provider(&endpoint).generate(&request()).await;
    assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    assert_eq!(stub.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_model() -> anyhow::Result<()> {
    let (endpoint, _stub) = spawn_stub(vec![(StatusCode::NOT_FOUND, "{}".to_string())]).await?;

    let result = provider(&endpoint).generate(&request()).await;
    assert_eq!(result, Err(LlmError::ModelNotAvailable("gemini-2.5-flash".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_plain_text_body_is_tolerated() -> anyhow::Result<()> {
    let (endpoint, _stub) = spawn_stub(vec![(
        StatusCode::OK,
        "Here you go: {\"diagnosis\": \"Flu\"}".to_string(),
    )])
    .await?;

    let text = provider(&endpoint).generate(&request()).await?;
    assert!(text.contains("\"diagnosis\""));
    Ok(())
}

#[tokio::test]
async fn test_blocked_prompt() -> anyhow::Result<()> {
    let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
    let (endpoint, _stub) = spawn_stub(vec![(StatusCode::OK, body.to_string())]).await?;

    let result = provider(&endpoint).generate(&request()).await;
    assert_eq!(result, Err(LlmError::Blocked("SAFETY".to_string())));
    Ok(())
}
