//! Trait definitions for external interactions
//!
//! These traits define the boundary between the domain and the hosted model.
//! Implementations live in `mediscript-llm`.

use crate::ImagePayload;
use serde_json::Value;
use std::future::Future;

/// Everything the remote model needs for one structured extraction
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// The document image
    pub image: ImagePayload,

    /// User-turn instruction sent alongside the image
    pub instruction: String,

    /// System instruction describing the extraction task
    pub system_instruction: String,

    /// JSON schema the response must follow, passed through verbatim
    pub response_schema: Value,

    /// Requested response mime type (normally `application/json`)
    pub response_mime_type: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Trait for multimodal model operations
///
/// Implemented by the infrastructure layer (mediscript-llm)
pub trait VisionProvider {
    /// Error type for provider operations
    type Error;

    /// Name of the model requests are sent to
    fn model_name(&self) -> &str;

    /// Send the image and instructions, returning the model's response text
    fn generate(
        &self,
        request: &VisionRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
