//! Load document images into base64 payloads

use crate::error::ExtractorError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mediscript_domain::ImagePayload;
use std::path::Path;
use tracing::debug;

/// Shown when the input is not an image
pub const INVALID_IMAGE_MESSAGE: &str = "Please upload a valid image file (JPEG, PNG, WEBP).";

/// Reads images from disk or data URLs and checks them before upload
#[derive(Debug, Clone, Copy)]
pub struct ImageLoader {
    max_bytes: usize,
}

impl ImageLoader {
    /// Create a loader that rejects images larger than `max_bytes`
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Read an image file
    ///
    /// The mime type comes from the file's magic bytes, falling back to the
    /// extension when the signature is unknown.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<ImagePayload, ExtractorError> {
        let path = path.as_ref();

        // Refuse oversized files before pulling them into memory
        let len = usize::try_from(std::fs::metadata(path)?.len()).unwrap_or(usize::MAX);
        if len > self.max_bytes {
            return Err(ExtractorError::ImageTooLarge(len, self.max_bytes));
        }
        let bytes = std::fs::read(path)?;

        let mime = match detect_mime(&bytes) {
            Some(mime) => Some(mime),
            None => mime_from_extension(path),
        };

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.from_bytes(&bytes, mime, source)
    }

    /// Encode raw bytes of a known (or detected) mime type
    pub fn from_bytes(
        &self,
        bytes: &[u8],
        mime: Option<&str>,
        source: impl Into<String>,
    ) -> Result<ImagePayload, ExtractorError> {
        let mime = mime
            .or_else(|| detect_mime(bytes))
            .ok_or_else(|| ExtractorError::InvalidImage(INVALID_IMAGE_MESSAGE.to_string()))?;

        self.check(bytes.len(), mime)?;

        debug!(mime, bytes = bytes.len(), "Encoded image payload");
        Ok(ImagePayload::new(mime, BASE64.encode(bytes), bytes.len()).with_source(source))
    }

    /// Accept a `data:<mime>;base64,<data>` URL
    pub fn from_data_url(&self, url: &str) -> Result<ImagePayload, ExtractorError> {
        let invalid = || ExtractorError::InvalidImage(INVALID_IMAGE_MESSAGE.to_string());

        let rest = url.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
        let mime = header.strip_suffix(";base64").ok_or_else(invalid)?;

        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| ExtractorError::InvalidImage(format!("Invalid base64 data: {}", e)))?;

        self.check(bytes.len(), mime)?;

        Ok(ImagePayload::new(mime, data.trim(), bytes.len()).with_source("data-url"))
    }

    fn check(&self, len: usize, mime: &str) -> Result<(), ExtractorError> {
        if !mime.starts_with("image/") {
            return Err(ExtractorError::InvalidImage(INVALID_IMAGE_MESSAGE.to_string()));
        }
        if len == 0 {
            return Err(ExtractorError::InvalidImage("The image file is empty.".to_string()));
        }
        if len > self.max_bytes {
            return Err(ExtractorError::ImageTooLarge(len, self.max_bytes));
        }
        Ok(())
    }
}

/// Identify a file type from its leading bytes
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        match &bytes[8..12] {
            b"heic" | b"heix" | b"hevc" | b"hevx" => return Some("image/heic"),
            b"mif1" | b"msf1" | b"heif" => return Some("image/heif"),
            _ => {}
        }
    }
    if bytes.starts_with(b"BM") && bytes.len() > 14 {
        return Some("image/bmp");
    }
    if bytes.starts_with(b"%PDF") {
        return Some("application/pdf");
    }
    None
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
