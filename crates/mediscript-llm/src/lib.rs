//! MediScript LLM Provider Layer
//!
//! Implementations of the `VisionProvider` trait from `mediscript-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Google Gemini `generateContent` over HTTP
//!
//! # Examples
//!
//! ```
//! use mediscript_domain::{ImagePayload, VisionProvider, VisionRequest};
//! use mediscript_llm::MockProvider;
//!
//! # async fn example() {
//! let provider = MockProvider::new(r#"{"diagnosis": "Flu"}"#);
//! let request = VisionRequest {
//!     image: ImagePayload::new("image/png", "AAAA", 3),
//!     instruction: "Extract".to_string(),
//!     system_instruction: String::new(),
//!     response_schema: serde_json::json!({}),
//!     response_mime_type: "application/json".to_string(),
//!     temperature: 0.1,
//! };
//! let text = provider.generate(&request).await.unwrap();
//! assert!(text.contains("Flu"));
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;

use mediscript_domain::{VisionProvider, VisionRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use gemini::{normalize_response_text, GeminiProvider};

/// Errors that can occur while talking to the hosted model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// No API key was configured
    #[error("API key is missing")]
    MissingApiKey,

    /// API key rejected by the service
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Response carried no text
    #[error("Empty response from model")]
    EmptyResponse,

    /// The service refused to answer (safety filter, policy)
    #[error("Response blocked: {0}")]
    Blocked(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. Queued
/// responses are consumed first, then the default response is returned.
///
/// # Examples
///
/// ```
/// use mediscript_llm::{LlmError, MockProvider};
///
/// let provider = MockProvider::new("{}");
/// provider.push_error(LlmError::RateLimitExceeded);
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: Result<String, LlmError>,
    queued: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<VisionRequest>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-vision".to_string(),
            default_response: Ok(response.into()),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            delay: None,
        }
    }

    /// Create a MockProvider that always fails
    pub fn failing(error: LlmError) -> Self {
        let mut provider = Self::new("");
        provider.default_response = Err(error);
        provider
    }

    /// Override the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response for the next call
    pub fn push_response(&self, response: impl Into<String>) {
        self.queued.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue an error for the next call
    pub fn push_error(&self, error: LlmError) {
        self.queued.lock().unwrap().push_back(Err(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// The most recent request received
    pub fn last_request(&self) -> Option<VisionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl VisionProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &VisionRequest) -> Result<String, LlmError> {
        let response = {
            *self.call_count.lock().unwrap() += 1;
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.queued
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default_response.clone())
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        response
    }
}
