//! Temporary resource identifiers for video sources.
//!
//! Decoders read from a location, not from a byte slice, so a
//! [`VideoSource`] is materialised into a named temporary file for the
//! lifetime of one decode session. The file is deleted when the
//! [`TemporaryResource`] is released or dropped.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};

use crate::{error::ExtractionError, source::VideoSource};

/// A temporary on-disk copy of a video source.
#[derive(Debug)]
pub struct TemporaryResource {
    file: NamedTempFile,
}

impl TemporaryResource {
    /// Write `source` to a fresh temporary file.
    ///
    /// The source's extension is kept so container probing can use it.
    pub fn create(source: &VideoSource) -> Result<Self, ExtractionError> {
        let suffix = source
            .extension()
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default();

        let mut file = Builder::new()
            .prefix("shotframe-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(source.content())?;
        file.flush()?;

        log::debug!(
            "Created temporary resource {} for {}",
            file.path().display(),
            source.name()
        );

        Ok(Self { file })
    }

    /// Location a decoder can open.
    pub fn location(&self) -> &Path {
        self.file.path()
    }

    /// Delete the temporary file.
    ///
    /// Returns the path that was released so callers can log or verify it.
    pub fn release(self) -> PathBuf {
        let path = self.file.path().to_path_buf();
        if let Err(error) = self.file.close() {
            log::warn!(
                "Failed to delete temporary resource {}: {error}",
                path.display()
            );
        } else {
            log::debug!("Released temporary resource {}", path.display());
        }
        path
    }
}
