//! MediScript Domain Layer
//!
//! This crate contains the domain model shared by every other MediScript crate.
//! It defines the extracted medical record, the image payload handed to the
//! remote model, the analysis session status machine, and the trait boundary
//! that provider implementations plug into.
//!
//! ## Key Concepts
//!
//! - **ExtractedMedicalData**: Whatever structure the remote model emits, with
//!   the well-known fields typed and everything else kept verbatim
//! - **ImagePayload**: A base64-encoded image plus its mime type
//! - **Session**: Idle → Processing → Complete / Error lifecycle of one analysis
//! - **VisionProvider**: The boundary to the hosted multimodal model
//!
//! ## Architecture
//!
//! - Pure data and state only, no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod image;
pub mod record;
pub mod status;
pub mod traits;

// Re-exports for convenience
pub use image::ImagePayload;
pub use record::{ExtractedMedicalData, INTERNAL_KEYS};
pub use status::{AppStatus, Session, StatusError};
pub use traits::{VisionProvider, VisionRequest};
