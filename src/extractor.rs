//! Single-frame extraction.
//!
//! [`FrameExtractor`] turns a [`VideoSource`] and a [`FramePosition`] into
//! one PNG-encoded still frame. Each call opens its own
//! [`DecodeSession`], waits for metadata, seeks, waits for the seek to land,
//! and captures the frame, while a watchdog timer and an optional
//! [`CancellationToken`](crate::CancellationToken) race against it. The
//! first terminal event settles the call; the session is then closed and
//! every later signal is dropped with it.
//!
//! # Example
//!
//! ```no_run
//! use shotframe::{FrameExtractor, FramePosition, VideoSource};
//!
//! # async fn example() -> Result<(), shotframe::ExtractionError> {
//! let extractor = FrameExtractor::new();
//! let source = VideoSource::open("scene1.mp4")?;
//! let frame = extractor.extract_frame(&source, FramePosition::End).await?;
//! frame.save("scene1_last_frame.png")?;
//! # Ok(())
//! # }
//! ```

use std::{future, time::Duration};

use tokio::time::Instant;

use crate::{
    backend::DecodeBackend,
    configuration::ExtractOptions,
    error::ExtractionError,
    ffmpeg::FfmpegBackend,
    frame::ExtractedFrame,
    position::FramePosition,
    progress::ProgressTracker,
    session::{DecodeSession, ReadinessStage, Transition, offload},
    source::VideoSource,
};

/// Extracts first or last frames from videos.
///
/// Generic over the [`DecodeBackend`]; [`FrameExtractor::new`] uses
/// FFmpeg. An extractor holds no per-call state, so one instance can serve
/// any number of concurrent extractions.
#[derive(Debug, Clone)]
pub struct FrameExtractor<B = FfmpegBackend> {
    backend: B,
    options: ExtractOptions,
}

impl FrameExtractor<FfmpegBackend> {
    /// Create an FFmpeg-backed extractor with default options.
    pub fn new() -> Self {
        Self::with_backend(FfmpegBackend::new())
    }
}

impl Default for FrameExtractor<FfmpegBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: DecodeBackend> FrameExtractor<B> {
    /// Create an extractor over a custom backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: ExtractOptions::new(),
        }
    }

    /// Replace the default options used by [`extract_frame`](FrameExtractor::extract_frame).
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// The default options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// The decode backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract the frame at `position` using the extractor's options.
    ///
    /// Settles exactly once. No retries are attempted.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::Timeout`] if the watchdog fires first.
    /// - [`ExtractionError::DecodeError`] if the pipeline reports a fault.
    /// - [`ExtractionError::RenderContextUnavailable`] if no render target
    ///   can be allocated for the video's natural size.
    /// - [`ExtractionError::Cancelled`] if the configured token is cancelled.
    pub async fn extract_frame(
        &self,
        source: &VideoSource,
        position: FramePosition,
    ) -> Result<ExtractedFrame, ExtractionError> {
        self.extract_frame_with_options(source, position, &self.options)
            .await
    }

    /// Extract the frame at `position` with explicit options.
    pub async fn extract_frame_with_options(
        &self,
        source: &VideoSource,
        position: FramePosition,
        options: &ExtractOptions,
    ) -> Result<ExtractedFrame, ExtractionError> {
        if options.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }

        log::debug!(
            "Extracting {position} frame from {} ({}, {} bytes)",
            source.name(),
            source.mime_type(),
            source.content().len()
        );

        let mut tracker = ProgressTracker::new(options.progress.clone());
        let mut session = DecodeSession::open(&self.backend, source, options.hints).await?;
        tracker.report(ReadinessStage::Uninitialized);

        let outcome = drive(&mut session, position, options, &mut tracker).await;
        session.close();

        match &outcome {
            Ok(frame) => log::info!(
                "Extracted {position} frame from {} ({}x{} at {:.3}s)",
                source.name(),
                frame.width,
                frame.height,
                frame.timestamp.as_secs_f64()
            ),
            Err(error) => {
                tracker.report(ReadinessStage::Errored);
                log::warn!(
                    "Failed to extract {position} frame from {}: {error}",
                    source.name()
                );
            }
        }

        outcome
    }
}

/// Race the session's signals against the watchdog and cancellation until
/// one of them settles the extraction.
async fn drive(
    session: &mut DecodeSession,
    position: FramePosition,
    options: &ExtractOptions,
    tracker: &mut ProgressTracker,
) -> Result<ExtractedFrame, ExtractionError> {
    let watchdog = tokio::time::sleep(options.watchdog);
    tokio::pin!(watchdog);

    let cancellation = options.cancellation.clone();
    let cancelled = async move {
        match cancellation {
            Some(token) => token.cancelled().await,
            None => future::pending().await,
        }
    };
    tokio::pin!(cancelled);

    loop {
        tokio::select! {
            biased;

            () = &mut cancelled => return Err(ExtractionError::Cancelled),

            signal = session.next_signal() => {
                let Some(signal) = signal else {
                    return Err(ExtractionError::DecodeError(
                        "decode pipeline stopped without reporting a result".to_string(),
                    ));
                };

                match session.accept(signal) {
                    Transition::Seek(info) => {
                        tracker.report(ReadinessStage::MetadataLoaded);
                        let target = position.target_timestamp(info.duration, options.edge_offset);
                        session.seek(target)?;
                        tracker.set_target(target);
                        tracker.report(ReadinessStage::Seeking);

                        if let Err(error) = session.play() {
                            log::debug!("Ignoring failed playback nudge: {error}");
                        }
                    }
                    Transition::Capture => {
                        tracker.report(ReadinessStage::Ready);
                        return capture(session, position, options).await;
                    }
                    Transition::Fail(message) => {
                        return Err(ExtractionError::DecodeError(message));
                    }
                    Transition::Ignore => {
                        // Stray signals can keep this arm ready indefinitely.
                        if Instant::now() >= watchdog.deadline() {
                            return Err(ExtractionError::Timeout { after: options.watchdog });
                        }
                    }
                }
            }

            () = &mut watchdog => {
                return Err(ExtractionError::Timeout { after: options.watchdog });
            }
        }
    }
}

/// Draw and encode the ready frame on the blocking pool.
async fn capture(
    session: &mut DecodeSession,
    position: FramePosition,
    options: &ExtractOptions,
) -> Result<ExtractedFrame, ExtractionError> {
    let render_target = session.capture(options.max_render_pixels).await?;
    let (width, height) = (render_target.width(), render_target.height());
    let png = offload(move || render_target.encode_png()).await?;

    Ok(ExtractedFrame {
        png,
        width,
        height,
        position,
        timestamp: session.target().unwrap_or(Duration::ZERO),
    })
}
