//! Gemini Provider Implementation
//!
//! Sends a document image to Google's `generateContent` endpoint and returns
//! the model's text.
//!
//! # Features
//!
//! - Image sent inline as base64 alongside the instruction text
//! - Response schema and mime type passed through in `generationConfig`
//! - Tolerant response handling (candidate parts, bare `text`, plain JSON)
//! - Retry with exponential backoff for transient failures
//!
//! # Examples
//!
//! ```no_run
//! use mediscript_llm::GeminiProvider;
//!
//! let provider = GeminiProvider::new("AIza...", "gemini-2.5-flash")
//!     .unwrap()
//!     .with_max_retries(2);
//! ```

use crate::LlmError;
use mediscript_domain::{VisionProvider, VisionRequest};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default timeout for a single request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons that mean the model refused rather than ran dry
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Google Gemini provider for multimodal extraction
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
    temperature: f32,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: Google AI Studio API key (may be empty; calls then fail with
    ///   [`LlmError::MissingApiKey`] before any network I/O)
    /// - `model`: Model to use (e.g., "gemini-2.5-flash")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.into().trim().to_string(),
            client,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the first backoff delay; later delays double
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Full URL of the generateContent call
    pub fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    /// Build the JSON body for a request
    pub fn request_body(request: &VisionRequest) -> Value {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: &request.image.mime_type,
                            data: &request.image.data,
                        },
                    },
                    Part::Text {
                        text: &request.instruction,
                    },
                ],
            }],
            system_instruction: (!request.system_instruction.trim().is_empty()).then(|| Content {
                role: None,
                parts: vec![Part::Text {
                    text: &request.system_instruction,
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: &request.response_mime_type,
                response_schema: &request.response_schema,
                temperature: request.temperature,
            },
        };

        // Plain data with string keys cannot fail to serialize
        serde_json::to_value(body).unwrap_or(Value::Null)
    }

    /// Send the request, retrying transient failures with exponential backoff
    pub async fn generate_content(&self, request: &VisionRequest) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let url = self.url();
        let body = Self::request_body(request);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.send_once(&url, &body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    warn!(attempt = attempts + 1, error = %e, "Gemini request failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            attempts += 1;
            if attempts < self.max_retries {
                tokio::time::sleep(self.backoff_delay(attempts)).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }

    /// Exponential backoff: base, 2x base, 4x base, ... saturating instead of overflowing
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<String, LlmError> {
        debug!(model = %self.model, "Sending generateContent request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::Communication(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &raw, &self.model));
        }

        debug!(bytes = raw.len(), "Received generateContent response");

        // Some proxies answer with bare text instead of the JSON envelope
        let body: Value =
            serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw.clone()));
        normalize_response_text(&body)
    }
}

impl VisionProvider for GeminiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &VisionRequest) -> Result<String, LlmError> {
        self.generate_content(request).await
    }
}

/// Pull the model's text out of whichever response shape arrived
///
/// Accepted shapes, in order:
/// 1. `candidates[*].content.parts[*].text` (first candidate with text wins,
///    its parts are concatenated, thought parts skipped)
/// 2. a top-level `text`, `output` or `response` string
/// 3. a bare JSON string
/// 4. a JSON object that is not an API envelope, returned re-serialized
pub fn normalize_response_text(body: &Value) -> Result<String, LlmError> {
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(LlmError::Blocked(reason.to_string()));
    }

    if let Some(error) = body.get("error") {
        return Err(LlmError::InvalidResponse(error_message(error)));
    }

    if let Some(candidates) = body.get("candidates").and_then(Value::as_array) {
        for candidate in candidates {
            let text = candidate
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|part| part.get("thought").and_then(Value::as_bool) != Some(true))
                        .filter_map(|part| part.get("text").and_then(Value::as_str))
                        .collect::<String>()
                })
                .unwrap_or_default();

            if !text.trim().is_empty() {
                return Ok(text);
            }
        }

        let blocked = candidates
            .iter()
            .filter_map(|c| c.get("finishReason").and_then(Value::as_str))
            .find(|reason| BLOCKING_FINISH_REASONS.contains(reason));
        if let Some(reason) = blocked {
            return Err(LlmError::Blocked(reason.to_string()));
        }
        return Err(LlmError::EmptyResponse);
    }

    for key in ["text", "output", "response"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            if text.trim().is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            return Ok(text.to_string());
        }
    }

    match body {
        Value::String(text) if !text.trim().is_empty() => Ok(text.clone()),
        Value::Object(map) if !map.is_empty() && !map.contains_key("promptFeedback") => {
            Ok(body.to_string())
        }
        _ => Err(LlmError::EmptyResponse),
    }
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

/// Map a non-success HTTP status and its body to an error
fn status_error(status: StatusCode, raw: &str, model: &str) -> LlmError {
    let parsed: Option<Value> = serde_json::from_str(raw).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .map(error_message)
        .unwrap_or_else(|| raw.trim().to_string());
    let detail = format!("HTTP {}: {}", status.as_u16(), message);

    match status {
        StatusCode::BAD_REQUEST => {
            let key_problem = message.to_lowercase().contains("api key")
                || raw.contains("API_KEY_INVALID");
            if key_problem {
                LlmError::Unauthorized(detail)
            } else {
                LlmError::InvalidRequest(detail)
            }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized(detail),
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        // Any other 4xx will fail the same way again
        _ if status.is_client_error() => LlmError::InvalidRequest(detail),
        _ => LlmError::Communication(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediscript_domain::ImagePayload;
    use serde_json::json;

    fn request() -> VisionRequest {
        VisionRequest {
            image: ImagePayload::new("image/png", "iVBORw0KGgo=", 8),
            instruction: "Extract the medical information".to_string(),
            system_instruction: "You are an OCR assistant".to_string(),
            response_schema: json!({"type": "OBJECT"}),
            response_mime_type: "application/json".to_string(),
            temperature: 0.1,
        }
    }

    #[test]
    fn test_gemini_provider_creation() {
        let provider = GeminiProvider::new("  key  ", "gemini-2.5-flash").unwrap();
        assert_eq!(provider.api_key, "key");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(
            provider.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_with_endpoint_strips_trailing_slash() {
        let provider = GeminiProvider::new("k", "m")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9000/")
            .with_max_retries(0);
        assert_eq!(provider.url(), "http://127.0.0.1:9000/v1beta/models/m:generateContent");
        assert_eq!(provider.max_retries, 1);
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiProvider::request_body(&request());

        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"],
            json!({"mimeType": "image/png", "data": "iVBORw0KGgo="})
        );
        assert_eq!(
            body["contents"][0]["parts"][1]["text"],
            "Extract the medical information"
        );
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are an OCR assistant"
        );
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"], json!({"type": "OBJECT"}));
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_request_body_without_system_instruction() {
        let mut req = request();
        req.system_instruction = "   ".to_string();
        let body = GeminiProvider::request_body(&req);
        assert!(body.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        // Unroutable endpoint: reaching the network would produce a Communication error
        let provider = GeminiProvider::new("   ", "gemini-2.5-flash")
            .unwrap()
            .with_endpoint("http://localhost:1");
        let result = provider.generate(&request()).await;
        assert_eq!(result, Err(LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_gemini_error_handling() {
        let provider = GeminiProvider::new("key", "gemini-2.5-flash")
            .unwrap()
            .with_endpoint("http://localhost:1")
            .with_max_retries(1);

        match provider.generate(&request()).await {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_candidate_parts() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "{\"age\":"},
                    {"text": "\"34\"}"}
                ]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(normalize_response_text(&body).unwrap(), r#"{"age":"34"}"#);
    }

    #[test]
    fn test_normalize_skips_empty_candidates() {
        let body = json!({
            "candidates": [
                {"content": {"parts": []}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        });
        assert_eq!(normalize_response_text(&body).unwrap(), "second");
    }

    #[test]
    fn test_normalize_blocked() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(
            normalize_response_text(&body),
            Err(LlmError::Blocked("SAFETY".to_string()))
        );

        let body = json!({"candidates": [{"finishReason": "SAFETY"}]});
        assert_eq!(
            normalize_response_text(&body),
            Err(LlmError::Blocked("SAFETY".to_string()))
        );
    }

    #[test]
    fn test_normalize_empty() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "STOP"}]});
        assert_eq!(normalize_response_text(&body), Err(LlmError::EmptyResponse));
        assert_eq!(normalize_response_text(&json!({})), Err(LlmError::EmptyResponse));
        assert_eq!(normalize_response_text(&json!(null)), Err(LlmError::EmptyResponse));
        assert_eq!(normalize_response_text(&json!({"text": ""})), Err(LlmError::EmptyResponse));
    }

    #[test]
    fn test_normalize_alternate_shapes() {
        assert_eq!(normalize_response_text(&json!({"text": "hello"})).unwrap(), "hello");
        assert_eq!(normalize_response_text(&json!({"output": "out"})).unwrap(), "out");
        assert_eq!(normalize_response_text(&json!("bare text")).unwrap(), "bare text");

        let direct = normalize_response_text(&json!({"diagnosis": "Flu"})).unwrap();
        assert_eq!(direct, r#"{"diagnosis":"Flu"}"#);
    }

    #[test]
    fn test_normalize_error_envelope() {
        let body = json!({"error": {"code": 500, "message": "Internal"}});
        assert_eq!(
            normalize_response_text(&body),
            Err(LlmError::InvalidResponse("Internal".to_string()))
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let bad_key = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, bad_key, "m"),
            LlmError::Unauthorized(_)
        ));

        let bad_req = r#"{"error":{"code":400,"message":"Invalid schema"}}"#;
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, bad_req, "m"),
            LlmError::InvalidRequest("HTTP 400: Invalid schema".to_string())
        );

        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "", "m"),
            LlmError::Unauthorized(_)
        ));
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "", "gemini-x"),
            LlmError::ModelNotAvailable("gemini-x".to_string())
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", "m"),
            LlmError::RateLimitExceeded
        );
        assert_eq!(
            status_error(StatusCode::PAYLOAD_TOO_LARGE, r#"{"error":{"message":"too big"}}"#, "m"),
            LlmError::InvalidRequest("HTTP 413: too big".to_string())
        );
        assert!(!status_error(StatusCode::UNPROCESSABLE_ENTITY, "", "m").is_retryable());
        assert_eq!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded", "m"),
            LlmError::Communication("HTTP 503: overloaded".to_string())
        );
    }

    #[test]
    fn test_backoff_delay_doubles_and_saturates() {
        let provider = GeminiProvider::new("k", "m")
            .unwrap()
            .with_backoff_base(Duration::from_millis(100));
        assert_eq!(provider.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(provider.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(provider.backoff_delay(40), provider.backoff_delay(u32::MAX));
        assert!(provider.backoff_delay(40) > provider.backoff_delay(3));

        let huge = GeminiProvider::new("k", "m")
            .unwrap()
            .with_backoff_base(Duration::from_secs(u64::MAX / 2));
        assert_eq!(huge.backoff_delay(3), Duration::MAX);
    }
}
