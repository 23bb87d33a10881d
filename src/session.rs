//! Scoped decode sessions.
//!
//! A [`DecodeSession`] owns everything one extraction allocates: the
//! temporary resource holding the source bytes, the backend's decode
//! pipeline, and the receiving end of the pipeline's signal channel. It is
//! opened at the start of an extraction and closed exactly once before the
//! extraction settles, on every path. Dropping an unclosed session closes
//! it, so an abandoned extraction future leaks nothing either.

use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::{
    backend::{DecodeBackend, DecodePipeline, MediaInfo, MediaSignal, PipelineHints},
    error::ExtractionError,
    render::RenderTarget,
    resource::TemporaryResource,
    source::VideoSource,
};

/// How far a decode session has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadinessStage {
    /// Attached, waiting for metadata.
    Uninitialized,
    /// Duration and dimensions are known.
    MetadataLoaded,
    /// A seek has been issued and not yet completed.
    Seeking,
    /// The seek completed; a frame can be captured.
    Ready,
    /// The pipeline reported a fault.
    Errored,
}

/// What the extractor should do in response to a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Metadata arrived for the first time; issue the seek.
    Seek(MediaInfo),
    /// The issued seek completed; capture the frame.
    Capture,
    /// The pipeline failed.
    Fail(String),
    /// The signal is a duplicate or arrived in the wrong stage.
    Ignore,
}

/// An ephemeral decode context bound to one [`VideoSource`].
pub struct DecodeSession {
    resource: Option<TemporaryResource>,
    pipeline: Option<Box<dyn DecodePipeline>>,
    signals: UnboundedReceiver<MediaSignal>,
    stage: ReadinessStage,
    info: Option<MediaInfo>,
    target: Option<Duration>,
    label: String,
}

impl DecodeSession {
    /// Materialise `source` and attach a pipeline from `backend` to it.
    ///
    /// The temporary resource is written on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::IoError`] if the temporary resource cannot
    /// be written, or whatever the backend reports if attaching fails. The
    /// temporary resource is released before returning in either case.
    pub async fn open<B: DecodeBackend + ?Sized>(
        backend: &B,
        source: &VideoSource,
        hints: PipelineHints,
    ) -> Result<Self, ExtractionError> {
        let owned = source.clone();
        let resource = offload(move || TemporaryResource::create(&owned)).await?;
        let (sender, signals) = unbounded_channel();

        let pipeline = match backend.attach(resource.location(), hints, sender) {
            Ok(pipeline) => pipeline,
            Err(error) => {
                resource.release();
                return Err(error);
            }
        };

        log::debug!("Opened decode session for {}", source.name());

        Ok(Self {
            resource: Some(resource),
            pipeline: Some(pipeline),
            signals,
            stage: ReadinessStage::Uninitialized,
            info: None,
            target: None,
            label: source.name().to_string(),
        })
    }

    /// The current stage.
    pub fn stage(&self) -> ReadinessStage {
        self.stage
    }

    /// Natural duration and dimensions, once metadata has loaded.
    pub fn info(&self) -> Option<MediaInfo> {
        self.info
    }

    /// The seek target, once a seek has been issued.
    pub fn target(&self) -> Option<Duration> {
        self.target
    }

    /// `true` once [`close`](DecodeSession::close) has run.
    pub fn is_closed(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Wait for the next signal from the pipeline.
    ///
    /// Returns `None` once every sender is gone or the session is closed.
    pub async fn next_signal(&mut self) -> Option<MediaSignal> {
        self.signals.recv().await
    }

    /// Advance the stage machine with `signal`.
    pub(crate) fn accept(&mut self, signal: MediaSignal) -> Transition {
        match (signal, self.stage) {
            (MediaSignal::MetadataLoaded(info), ReadinessStage::Uninitialized) => {
                self.info = Some(info);
                self.stage = ReadinessStage::MetadataLoaded;
                Transition::Seek(info)
            }
            (MediaSignal::Seeked, ReadinessStage::Seeking) => {
                self.stage = ReadinessStage::Ready;
                Transition::Capture
            }
            (MediaSignal::Error(message), stage) if stage != ReadinessStage::Errored => {
                self.stage = ReadinessStage::Errored;
                Transition::Fail(message)
            }
            (signal, stage) => {
                log::debug!("Ignoring {signal:?} while {stage:?} ({})", self.label);
                Transition::Ignore
            }
        }
    }

    /// Ask the pipeline to seek to `target`.
    pub fn seek(&mut self, target: Duration) -> Result<(), ExtractionError> {
        let pipeline = self.pipeline_mut()?;
        pipeline.seek(target)?;
        self.target = Some(target);
        self.stage = ReadinessStage::Seeking;
        log::debug!("Seeking {} to {:.3}s", self.label, target.as_secs_f64());
        Ok(())
    }

    /// Nudge the pipeline into decoding.
    pub fn play(&mut self) -> Result<(), ExtractionError> {
        self.pipeline_mut()?.play()
    }

    /// Draw the current frame into a new render target sized to the
    /// natural dimensions.
    ///
    /// The target is sized before the pipeline is asked for its frame, and
    /// the pixel copy or rescale runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::DecodeError`] if metadata never loaded or the
    ///   pipeline has no frame to draw.
    /// - [`ExtractionError::RenderContextUnavailable`] if the target cannot
    ///   be allocated.
    pub async fn capture(&mut self, max_pixels: u64) -> Result<RenderTarget, ExtractionError> {
        let info = self.info.ok_or_else(|| {
            ExtractionError::DecodeError("frame captured before metadata loaded".to_string())
        })?;
        let mut target = RenderTarget::allocate(info.width, info.height, max_pixels)?;
        let frame = self.pipeline_mut()?.snapshot()?;

        offload(move || {
            target.draw(&frame);
            Ok(target)
        })
        .await
    }

    /// Tear the session down: detach signal listeners, release the decode
    /// pipeline, and delete the temporary resource.
    ///
    /// Idempotent; only the first call does anything.
    pub fn close(&mut self) {
        let Some(mut pipeline) = self.pipeline.take() else {
            return;
        };

        self.signals.close();
        while self.signals.try_recv().is_ok() {}

        pipeline.close();
        drop(pipeline);

        if let Some(resource) = self.resource.take() {
            resource.release();
        }

        log::debug!("Closed decode session for {}", self.label);
    }

    fn pipeline_mut(&mut self) -> Result<&mut Box<dyn DecodePipeline>, ExtractionError> {
        self.pipeline.as_mut().ok_or_else(|| {
            ExtractionError::DecodeError("decode session already closed".to_string())
        })
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Run CPU- or IO-bound `work` on tokio's blocking pool.
///
/// A task aborted by runtime shutdown maps to
/// [`ExtractionError::Cancelled`]; a panic in `work` is a decode fault.
pub(crate) async fn offload<T, F>(work: F) -> Result<T, ExtractionError>
where
    F: FnOnce() -> Result<T, ExtractionError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(error) if error.is_cancelled() => Err(ExtractionError::Cancelled),
        Err(error) => Err(ExtractionError::DecodeError(format!(
            "blocking task failed: {error}"
        ))),
    }
}
