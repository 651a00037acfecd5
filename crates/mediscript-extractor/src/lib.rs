//! MediScript Extractor
//!
//! Turns a photo of a medical document into structured fields using a hosted
//! multimodal model, and turns those fields into a ready-to-paste care-plan
//! prompt.
//!
//! # Architecture
//!
//! ```text
//! Image → ImageLoader → Extractor → VisionProvider → parse_extraction → ExtractedMedicalData
//!                                                                          │
//!                                                             CarePromptBuilder → prompt text
//! ```
//!
//! All document understanding happens in the remote model. This crate builds
//! the request (image, schema, instructions), finds the JSON in whatever text
//! comes back, and maps failures to messages a user can act on.
//!
//! # Example Usage
//!
//! ```no_run
//! use mediscript_extractor::{CarePromptBuilder, ExtractionConfig, Extractor, ImageLoader};
//! use mediscript_llm::GeminiProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractionConfig::default();
//! let provider = GeminiProvider::new("AIza...", &config.model)?;
//! let extractor = Extractor::new(provider, config.clone());
//!
//! let image = ImageLoader::new(config.max_image_bytes).load_path("prescription.jpg")?;
//! let outcome = extractor.extract(image).await?;
//!
//! println!("{}", CarePromptBuilder::new(&outcome.data).build());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod image;
mod parser;
mod prompt;
mod schema;
mod types;


pub use config::ExtractionConfig;
pub use error::{ExtractorError, GENERIC_FAILURE_MESSAGE};
pub use extractor::Extractor;
pub use image::{detect_mime, ImageLoader, INVALID_IMAGE_MESSAGE};
pub use parser::{extract_json, parse_extraction};
pub use prompt::{CarePromptBuilder, NEXT_STEP_HINT};
pub use schema::{response_schema, EXTRACTION_INSTRUCTION, EXTRACTION_SYSTEM_INSTRUCTION};
pub use types::{ExtractionMetadata, ExtractionOutcome};
