//! Configuration for the Extractor

use crate::schema::{EXTRACTION_INSTRUCTION, EXTRACTION_SYSTEM_INSTRUCTION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Model the request is addressed to
    pub model: String,

    /// Sampling temperature (low keeps extraction literal)
    pub temperature: f32,

    /// System instruction describing the task
    pub system_instruction: String,

    /// Instruction sent with the image
    pub instruction: String,

    /// Mime type requested for the answer
    pub response_mime_type: String,

    /// Largest accepted image (bytes)
    pub max_image_bytes: usize,

    /// Maximum time for a single extraction call (seconds)
    pub extraction_timeout_secs: u64,
}

impl ExtractionConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        if self.instruction.trim().is_empty() {
            return Err("instruction must not be empty".to_string());
        }
        if self.max_image_bytes == 0 {
            return Err("max_image_bytes must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    /// Default configuration matching the hosted Flash model
    fn default() -> Self {
        Self {
            model: mediscript_llm::gemini::DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            system_instruction: EXTRACTION_SYSTEM_INSTRUCTION.to_string(),
            instruction: EXTRACTION_INSTRUCTION.to_string(),
            response_mime_type: "application/json".to_string(),
            max_image_bytes: 20 * 1024 * 1024,
            extraction_timeout_secs: 90,
        }
    }
}

impl ExtractionConfig {
    /// Strict preset: deterministic sampling
    pub fn strict() -> Self {
        Self {
            temperature: 0.0,
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeout for large scans or slow networks
    pub fn lenient() -> Self {
        Self {
            temperature: 0.2,
            extraction_timeout_secs: 180,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
