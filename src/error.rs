//! Error types for the `shotframe` crate.
//!
//! [`ExtractionError`] is the terminal failure of a frame extraction. The
//! first three variants are the mutually exclusive outcomes of a decode
//! session; the rest cover I/O and image encoding around it. Every variant
//! carries a message fit for showing next to the input that caused it.

use std::{io::Error as IoError, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for frame extraction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// No terminal decode signal arrived within the watchdog interval.
    #[error("Video processing timed out after {after:?}. Please try a different file.")]
    Timeout {
        /// The watchdog interval that elapsed.
        after: Duration,
    },

    /// The decode pipeline reported a load or decode fault.
    #[error(
        "Error loading video. It may be corrupted or in an unsupported format: {0}"
    )]
    DecodeError(String),

    /// A render target for the captured frame could not be allocated.
    #[error("Could not get a render target for the captured frame: {0}")]
    RenderContextUnavailable(String),

    /// The extraction was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Frame extraction cancelled")]
    Cancelled,

    /// A frame position string was neither `"start"` nor `"end"`.
    #[error("Invalid frame position {0:?}: expected \"start\" or \"end\"")]
    InvalidPosition(String),

    /// An I/O error occurred while reading the source or writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// PNG encoding or decoding failed.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl ExtractionError {
    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Timeout { .. } => "timeout",
            ExtractionError::DecodeError(_) => "decode_error",
            ExtractionError::RenderContextUnavailable(_) => "render_context_unavailable",
            ExtractionError::Cancelled => "cancelled",
            ExtractionError::InvalidPosition(_) => "invalid_position",
            ExtractionError::IoError(_) => "io_error",
            ExtractionError::ImageError(_) => "image_error",
        }
    }
}

impl From<FfmpegError> for ExtractionError {
    fn from(error: FfmpegError) -> Self {
        ExtractionError::DecodeError(error.to_string())
    }
}
