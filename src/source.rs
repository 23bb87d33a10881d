//! Caller-supplied video resources.

use std::{fs, path::Path, sync::Arc};

use crate::error::ExtractionError;

/// An opaque video supplied by the caller: a name, a MIME type, and bytes.
///
/// Cloning is cheap; the content is shared. Extraction only borrows the
/// source and keeps no reference to it once it settles.
#[derive(Debug, Clone)]
pub struct VideoSource {
    name: String,
    mime_type: String,
    content: Arc<[u8]>,
}

impl VideoSource {
    /// Wrap in-memory video bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    /// Read a video file from disk.
    ///
    /// The MIME type is guessed from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::IoError`] if the file cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let mime_type = guess_mime_type(&name).to_string();

        log::debug!(
            "Loaded video source {} ({mime_type}, {} bytes)",
            path.display(),
            content.len()
        );

        Ok(Self::from_bytes(name, mime_type, content))
    }

    /// File name of the source, as uploaded.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type of the source.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw bytes of the source.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Extension of [`name`](VideoSource::name), if it has one.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name)
            .extension()
            .and_then(|extension| extension.to_str())
    }

    /// The name without its extension, falling back to `fallback`.
    pub fn stem_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(fallback)
    }
}

fn guess_mime_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        _ => "application/octet-stream",
    }
}
