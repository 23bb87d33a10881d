//! The seam between the extractor and a concrete media decoder.
//!
//! A [`DecodeBackend`] attaches a [`DecodePipeline`] to a temporary resource.
//! The pipeline reports its progress asynchronously by sending
//! [`MediaSignal`]s through the [`SignalSender`] it was given, and accepts
//! commands (seek, play, snapshot) from the extractor. Signals may arrive late,
//! out of order, or more than once; the extractor honours only the first
//! terminal one. Once the extractor tears the session down the receiving
//! half of the channel is gone and further sends fail silently.
//!
//! [`FfmpegBackend`](crate::FfmpegBackend) is the production implementation.

use std::{path::Path, time::Duration};

use tokio::sync::mpsc::UnboundedSender;

use image::RgbaImage;

use crate::error::ExtractionError;

/// Natural properties of a video, known once metadata has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    /// Natural duration of the video.
    pub duration: Duration,
    /// Natural decoded width in pixels.
    pub width: u32,
    /// Natural decoded height in pixels.
    pub height: u32,
}

/// An asynchronous event emitted by a decode pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSignal {
    /// Duration and dimensions are available; seeking is now allowed.
    MetadataLoaded(MediaInfo),
    /// A previously requested seek completed and a frame is ready to draw.
    Seeked,
    /// The pipeline hit a load or decode fault.
    Error(String),
}

/// Sending half of a pipeline's signal channel.
pub type SignalSender = UnboundedSender<MediaSignal>;

/// Presentation hints carried to the pipeline when it is attached.
///
/// None of these change which frame is extracted. They let a backend skip
/// work the extractor will never need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineHints {
    /// Load metadata only until a seek is requested.
    pub metadata_only: bool,
    /// Do not produce audio output.
    pub muted: bool,
    /// Never open platform playback chrome.
    pub inline: bool,
}

impl Default for PipelineHints {
    fn default() -> Self {
        Self {
            metadata_only: true,
            muted: true,
            inline: true,
        }
    }
}

/// Creates decode pipelines bound to a media location.
pub trait DecodeBackend: Send + Sync {
    /// Attach a pipeline to the media at `location`.
    ///
    /// The pipeline must eventually send either
    /// [`MediaSignal::MetadataLoaded`] or [`MediaSignal::Error`] on
    /// `signals`, unless it stalls (which the extractor's watchdog covers).
    fn attach(
        &self,
        location: &Path,
        hints: PipelineHints,
        signals: SignalSender,
    ) -> Result<Box<dyn DecodePipeline>, ExtractionError>;
}

/// A live decode context for one media resource.
pub trait DecodePipeline: Send {
    /// Request a seek to `target`. Completion is signalled with
    /// [`MediaSignal::Seeked`].
    fn seek(&mut self, target: Duration) -> Result<(), ExtractionError>;

    /// Nudge the pipeline into decoding. Failure is tolerated by callers.
    fn play(&mut self) -> Result<(), ExtractionError>;

    /// Hand over the currently decoded frame.
    ///
    /// Called on the async executor, so it must not decode or convert;
    /// the session scales the frame to the render target off-thread.
    fn snapshot(&mut self) -> Result<RgbaImage, ExtractionError>;

    /// Release the decode context. Called exactly once by the session.
    fn close(&mut self);
}
