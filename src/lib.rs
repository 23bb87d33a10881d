//! # shotframe
//!
//! Extract boundary still frames from video clips for transition
//! storyboarding.
//!
//! `shotframe` pulls the first or last decodable frame out of a video as a
//! PNG. Each extraction is asynchronous and settles exactly once: a decode
//! pipeline reports metadata, seek completion, or failure, while a watchdog
//! timer and an optional cancellation token race against it. Whatever
//! happens, the temporary resources behind the extraction are released
//! before the result is returned. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract the Last Frame of a Clip
//!
//! ```no_run
//! use shotframe::{FrameExtractor, FramePosition, VideoSource};
//!
//! # async fn example() -> Result<(), shotframe::ExtractionError> {
//! let source = VideoSource::open("scene1.mp4")?;
//! let frame = FrameExtractor::new()
//!     .extract_frame(&source, FramePosition::End)
//!     .await?;
//! frame.save("scene1_last_frame.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Tune the Watchdog
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use shotframe::{ExtractOptions, FrameExtractor};
//!
//! let extractor = FrameExtractor::new()
//!     .with_options(ExtractOptions::new().with_watchdog(Duration::from_secs(30)));
//! ```
//!
//! ### Both Sides of a Transition
//!
//! ```no_run
//! use shotframe::{FrameExtractor, TransitionFrames, VideoSource};
//!
//! # async fn example() -> Result<(), shotframe::ExtractionError> {
//! let extractor = FrameExtractor::new();
//! let frames = TransitionFrames::extract(
//!     &extractor,
//!     &VideoSource::open("scene1.mp4")?,
//!     &VideoSource::open("scene2.mp4")?,
//! )
//! .await;
//! frames.save_all("frames")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Decoders
//!
//! The extractor talks to decoders through the [`DecodeBackend`] and
//! [`DecodePipeline`] traits. [`FfmpegBackend`] is the default; any other
//! decoder that can report [`MediaSignal`]s and hand over decoded RGBA
//! frames can be plugged in with
//! [`FrameExtractor::with_backend`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod backend;
pub mod configuration;
mod conversion;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod frame;
pub mod position;
pub mod progress;
pub mod render;
pub mod resource;
pub mod session;
pub mod source;
pub mod storyboard;
pub mod transition;

pub use backend::{DecodeBackend, DecodePipeline, MediaInfo, MediaSignal, PipelineHints, SignalSender};
pub use configuration::{DEFAULT_EDGE_OFFSET, DEFAULT_MAX_RENDER_PIXELS, DEFAULT_WATCHDOG, ExtractOptions};
pub use error::ExtractionError;
pub use extractor::FrameExtractor;
pub use ffmpeg::{FfmpegBackend, FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::ExtractedFrame;
pub use position::FramePosition;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use render::RenderTarget;
pub use resource::TemporaryResource;
pub use session::{DecodeSession, ReadinessStage};
pub use source::VideoSource;
pub use storyboard::{ExportKind, GenerationSettings, Shot, StoryboardError, VideoFormat};
pub use transition::{SCENE1_LAST_FRAME_FILE_NAME, SCENE2_FIRST_FRAME_FILE_NAME, TransitionFrames};
