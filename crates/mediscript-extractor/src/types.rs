//! Result types for extraction

use mediscript_domain::ExtractedMedicalData;
use serde::Serialize;

/// Result of an extraction operation
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// Fields the model extracted
    pub data: ExtractedMedicalData,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    /// Where the image came from
    pub source: String,

    /// Name of the model used
    pub model_name: String,

    /// Unix timestamp (seconds) when extraction finished
    pub timestamp: u64,

    /// Wall-clock time spent, in milliseconds
    pub processing_time_ms: u64,

    /// Length of the raw model response in characters
    pub response_chars: usize,
}
