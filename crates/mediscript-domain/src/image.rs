//! Image payload module - the encoded document photo sent to the model

/// An image ready to be sent inline to the remote model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Mime type of the image (e.g. `image/jpeg`)
    pub mime_type: String,

    /// Base64-encoded image bytes, without any data-URL prefix
    pub data: String,

    /// Size of the decoded image in bytes
    pub byte_len: usize,

    /// Where the image came from (file name or "data-url")
    pub source: Option<String>,
}

impl ImagePayload {
    /// Create a payload from already-encoded data
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>, byte_len: usize) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
            byte_len,
            source: None,
        }
    }

    /// Attach a source label
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether the mime type names an image
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Label used in logs and status lines
    pub fn label(&self) -> &str {
        self.source.as_deref().unwrap_or("<inline image>")
    }
}
