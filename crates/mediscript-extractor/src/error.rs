//! Error types for the Extractor

use mediscript_llm::LlmError;
use thiserror::Error;

/// Shown for any failure the user cannot fix by changing the document type
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to extract information. Please check your API Key and ensure the image is clear.";

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// No API key configured
    #[error("API key is missing")]
    MissingApiKey,

    /// Input is not a usable image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Image exceeds the configured size limit
    #[error("Image too large: {0} bytes (max: {1})")]
    ImageTooLarge(usize, usize),

    /// Reading the image failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider error
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// The model answered with no content
    #[error("No data returned from the model")]
    NoData,

    /// Extraction timeout
    #[error("Extraction timeout")]
    Timeout,

    /// No usable JSON object in the model response
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Message suitable for showing to the person who uploaded the document
    pub fn user_message(&self) -> String {
        match self {
            ExtractorError::MissingApiKey => {
                "API Key is missing. Please provide a valid API Key.".to_string()
            }
            ExtractorError::InvalidImage(message) => message.clone(),
            ExtractorError::ImageTooLarge(size, max) => format!(
                "The image is too large ({:.1} MB). Please upload an image under {:.1} MB.",
                *size as f64 / (1024.0 * 1024.0),
                *max as f64 / (1024.0 * 1024.0)
            ),
            ExtractorError::Io(e) => format!("Could not read the image: {}", e),
            ExtractorError::NoData => "No data returned from the model.".to_string(),
            ExtractorError::Config(message) => format!("Configuration error: {}", message),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<LlmError> for ExtractorError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => ExtractorError::MissingApiKey,
            LlmError::EmptyResponse => ExtractorError::NoData,
            other => ExtractorError::Llm(other),
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_conversion() {
        assert!(matches!(
            ExtractorError::from(LlmError::MissingApiKey),
            ExtractorError::MissingApiKey
        ));
        assert!(matches!(
            ExtractorError::from(LlmError::EmptyResponse),
            ExtractorError::NoData
        ));
        assert!(matches!(
            ExtractorError::from(LlmError::RateLimitExceeded),
            ExtractorError::Llm(LlmError::RateLimitExceeded)
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ExtractorError::MissingApiKey.user_message(),
            "API Key is missing. Please provide a valid API Key."
        );
        assert_eq!(
            ExtractorError::NoData.user_message(),
            "No data returned from the model."
        );
        assert_eq!(
            ExtractorError::InvalidImage("Please upload a valid image file (JPEG, PNG, WEBP).".into())
                .user_message(),
            "Please upload a valid image file (JPEG, PNG, WEBP)."
        );
        assert_eq!(
            ExtractorError::ImageTooLarge(30 * 1024 * 1024, 20 * 1024 * 1024).user_message(),
            "The image is too large (30.0 MB). Please upload an image under 20.0 MB."
        );
    }

    #[test]
    fn test_generic_failures_hide_details() {
        for error in [
            ExtractorError::Timeout,
            ExtractorError::InvalidFormat("no JSON".into()),
            ExtractorError::JsonParse("eof".into()),
            ExtractorError::Llm(LlmError::Unauthorized("HTTP 403".into())),
            ExtractorError::Llm(LlmError::Blocked("SAFETY".into())),
        ] {
            assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
        }
    }
}
