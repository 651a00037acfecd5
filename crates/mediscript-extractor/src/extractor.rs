//! Core Extractor implementation

use crate::config::ExtractionConfig;
use crate::error::ExtractorError;
use crate::parser::parse_extraction;
use crate::schema::response_schema;
use crate::types::{ExtractionMetadata, ExtractionOutcome};
use mediscript_domain::{ImagePayload, VisionProvider, VisionRequest};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor sends a document image to the model and parses the answer
pub struct Extractor<P>
where
    P: VisionProvider,
{
    provider: P,
    config: ExtractionConfig,
}

impl<P> Extractor<P>
where
    P: VisionProvider,
    P::Error: Into<ExtractorError>,
{
    /// Create a new Extractor
    pub fn new(provider: P, config: ExtractionConfig) -> Self {
        Self { provider, config }
    }

    /// The provider requests are sent through
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Assemble the request for an image: image, schema and instructions
    pub fn build_request(&self, image: ImagePayload) -> VisionRequest {
        VisionRequest {
            image,
            instruction: self.config.instruction.clone(),
            system_instruction: self.config.system_instruction.clone(),
            response_schema: response_schema(),
            response_mime_type: self.config.response_mime_type.clone(),
            temperature: self.config.temperature,
        }
    }

    /// Extract medical fields from an image
    pub async fn extract(&self, image: ImagePayload) -> Result<ExtractionOutcome, ExtractorError> {
        if !image.is_image() {
            return Err(ExtractorError::InvalidImage(
                crate::image::INVALID_IMAGE_MESSAGE.to_string(),
            ));
        }
        if image.byte_len > self.config.max_image_bytes {
            return Err(ExtractorError::ImageTooLarge(
                image.byte_len,
                self.config.max_image_bytes,
            ));
        }

        let source = image.label().to_string();
        info!(
            "Starting extraction for '{}' ({}, {} bytes) with model '{}'",
            source,
            image.mime_type,
            image.byte_len,
            self.provider.model_name()
        );

        let start = Instant::now();
        let request = self.build_request(image);

        let response = timeout(
            self.config.extraction_timeout(),
            self.provider.generate(&request),
        )
        .await
        .map_err(|_| ExtractorError::Timeout)
        .and_then(|result| result.map_err(Into::<ExtractorError>::into))
        .inspect_err(|e| warn!("Extraction failed for '{}': {}", source, e))?;

        debug!("Model response length: {} chars", response.len());

        let data = parse_extraction(&response)
            .inspect_err(|e| warn!("Unusable model response for '{}': {}", source, e))?;
        if data.is_empty() {
            warn!("Model returned no populated fields for '{}'", source);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extraction complete: {} fields in {} ms",
            data.entries().len(),
            processing_time_ms
        );

        let metadata = ExtractionMetadata {
            source,
            model_name: self.provider.model_name().to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            processing_time_ms,
            response_chars: response.chars().count(),
        };

        Ok(ExtractionOutcome { data, metadata })
    }
}
