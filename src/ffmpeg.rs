//! FFmpeg decode backend and log level configuration.
//!
//! [`FfmpegBackend`] is the production [`DecodeBackend`]. Each attached
//! pipeline runs its demux/decode loop on a dedicated worker thread so that
//! blocking FFmpeg calls never stall the async runtime. The worker reports
//! progress as [`MediaSignal`]s and takes commands over a channel:
//!
//! 1. open the input, pick the best video stream, report
//!    [`MediaSignal::MetadataLoaded`];
//! 2. on a seek command, seek to the nearest keyframe at or before the
//!    target, decode forward to the first frame at or after it (or the last
//!    decodable frame if the stream ends first), convert it to RGBA, and
//!    report [`MediaSignal::Seeked`];
//! 3. exit once the pipeline is closed and the command channel drops.
//!
//! Any FFmpeg failure is reported as [`MediaSignal::Error`].
//!
//! FFmpeg also prints its own diagnostics to stderr, independent of the
//! Rust [`log`](https://crates.io/crates/log) facade.
//! [`set_ffmpeg_log_level`] tunes that output.
//!
//! ```no_run
//! use shotframe::FfmpegLogLevel;
//!
//! shotframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::{context::Context as CodecContext, decoder::Video as VideoDecoder},
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::RgbaImage;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    backend::{DecodeBackend, DecodePipeline, MediaInfo, MediaSignal, PipelineHints, SignalSender},
    conversion,
    error::ExtractionError,
};

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants. Setting a level causes
/// FFmpeg to suppress all messages below that severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only unrecoverable errors that abort the process.
    Panic,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Set FFmpeg's own stderr verbosity. Does not affect the `log` facade.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Get FFmpeg's current stderr verbosity.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}

/// Commands sent from the pipeline handle to its worker.
#[derive(Debug, Clone, Copy)]
enum Command {
    Seek(Duration),
    Play,
}

/// Shared slot holding the most recently captured frame.
type FrameSlot = Arc<Mutex<Option<RgbaImage>>>;

/// Decode backend built on FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    _private: (),
}

impl FfmpegBackend {
    /// Create the backend. FFmpeg itself is initialised lazily per worker.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecodeBackend for FfmpegBackend {
    fn attach(
        &self,
        location: &Path,
        hints: PipelineHints,
        signals: SignalSender,
    ) -> Result<Box<dyn DecodePipeline>, ExtractionError> {
        let (commands, command_receiver) = unbounded_channel();
        let frame: FrameSlot = Arc::new(Mutex::new(None));

        let worker = Worker {
            location: location.to_path_buf(),
            hints,
            signals,
            commands: command_receiver,
            frame: Arc::clone(&frame),
        };

        thread::Builder::new()
            .name("shotframe-decode".to_string())
            .spawn(move || worker.run())
            .map_err(|error| {
                ExtractionError::DecodeError(format!("failed to start decode worker: {error}"))
            })?;

        Ok(Box::new(FfmpegPipeline {
            commands: Some(commands),
            frame,
        }))
    }
}

/// Handle to a running FFmpeg worker.
struct FfmpegPipeline {
    commands: Option<UnboundedSender<Command>>,
    frame: FrameSlot,
}

impl FfmpegPipeline {
    fn send(&self, command: Command) -> Result<(), ExtractionError> {
        self.commands
            .as_ref()
            .ok_or_else(|| ExtractionError::DecodeError("decode pipeline closed".to_string()))?
            .send(command)
            .map_err(|_| ExtractionError::DecodeError("decode worker exited".to_string()))
    }
}

impl DecodePipeline for FfmpegPipeline {
    fn seek(&mut self, target: Duration) -> Result<(), ExtractionError> {
        self.send(Command::Seek(target))
    }

    fn play(&mut self) -> Result<(), ExtractionError> {
        self.send(Command::Play)
    }

    fn snapshot(&mut self) -> Result<RgbaImage, ExtractionError> {
        let mut slot = self.frame.lock().map_err(|_| {
            ExtractionError::DecodeError("decode worker panicked while storing a frame".to_string())
        })?;
        slot.take().ok_or_else(|| {
            ExtractionError::DecodeError("no decoded frame is available".to_string())
        })
    }

    fn close(&mut self) {
        // Dropping the sender ends the worker's command loop.
        self.commands = None;
        if let Ok(mut slot) = self.frame.lock() {
            slot.take();
        }
    }
}

/// State owned by the decode worker thread.
struct Worker {
    location: PathBuf,
    hints: PipelineHints,
    signals: SignalSender,
    commands: UnboundedReceiver<Command>,
    frame: FrameSlot,
}

/// An opened input with its video decoder.
struct OpenedInput {
    input: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    info: MediaInfo,
}

impl Worker {
    fn run(mut self) {
        if let Err(error) = self.serve() {
            log::debug!("Decode worker for {} failed: {error}", self.location.display());
            let message = match error {
                ExtractionError::DecodeError(message) => message,
                other => other.to_string(),
            };
            // The session may already be gone; nobody is left to tell.
            let _ = self.signals.send(MediaSignal::Error(message));
        }
    }

    fn serve(&mut self) -> Result<(), ExtractionError> {
        let mut opened = open_input(&self.location)?;

        log::trace!(
            "Decode worker attached to {} ({:?})",
            self.location.display(),
            self.hints
        );

        if self
            .signals
            .send(MediaSignal::MetadataLoaded(opened.info))
            .is_err()
        {
            return Ok(());
        }

        while let Some(command) = self.commands.blocking_recv() {
            match command {
                Command::Play => {}
                Command::Seek(target) => {
                    let image = decode_frame_at(&mut opened, target)?;
                    match self.frame.lock() {
                        Ok(mut slot) => *slot = Some(image),
                        Err(_) => {
                            return Err(ExtractionError::DecodeError(
                                "frame slot poisoned".to_string(),
                            ));
                        }
                    }
                    if self.signals.send(MediaSignal::Seeked).is_err() {
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

fn open_input(location: &Path) -> Result<OpenedInput, ExtractionError> {
    ffmpeg_next::init()
        .map_err(|error| ExtractionError::DecodeError(format!("FFmpeg initialisation failed: {error}")))?;

    let input = ffmpeg_next::format::input(&location)?;

    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| ExtractionError::DecodeError("No video stream found in file".to_string()))?;
    let stream_index = stream.index();
    let time_base = stream.time_base();
    let stream_duration = stream.duration();

    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let decoder = decoder_context.decoder().video()?;

    let info = MediaInfo {
        duration: conversion::natural_duration(input.duration(), stream_duration, time_base),
        width: decoder.width(),
        height: decoder.height(),
    };

    log::debug!(
        "Loaded metadata for {}: {}x{}, {:.3}s, codec={}",
        location.display(),
        info.width,
        info.height,
        info.duration.as_secs_f64(),
        decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    );

    Ok(OpenedInput {
        input,
        decoder,
        stream_index,
        time_base,
        info,
    })
}

/// Seek to the keyframe before `target` and decode forward to the first
/// frame at or after it.
fn decode_frame_at(opened: &mut OpenedInput, target: Duration) -> Result<RgbaImage, ExtractionError> {
    let seek_timestamp = conversion::duration_to_seek_timestamp(target);
    opened.input.seek(seek_timestamp, ..seek_timestamp)?;
    opened.decoder.flush();

    let target_seconds = target.as_secs_f64();
    let mut decoded = VideoFrame::empty();
    let mut held = VideoFrame::empty();
    let mut has_held = false;

    for (stream, packet) in opened.input.packets() {
        if stream.index() != opened.stream_index {
            continue;
        }

        opened.decoder.send_packet(&packet)?;

        while opened.decoder.receive_frame(&mut decoded).is_ok() {
            let pts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
            if conversion::pts_to_seconds(pts, opened.time_base) >= target_seconds {
                return frame_to_image(&decoded, opened.info);
            }
            std::mem::swap(&mut decoded, &mut held);
            has_held = true;
        }
    }

    opened.decoder.send_eof()?;
    while opened.decoder.receive_frame(&mut decoded).is_ok() {
        let pts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
        if conversion::pts_to_seconds(pts, opened.time_base) >= target_seconds {
            return frame_to_image(&decoded, opened.info);
        }
        std::mem::swap(&mut decoded, &mut held);
        has_held = true;
    }

    // The stream ended before the target; the last decodable frame wins.
    if has_held {
        return frame_to_image(&held, opened.info);
    }

    Err(ExtractionError::DecodeError(format!(
        "no decodable frame near {target_seconds:.3}s"
    )))
}

/// Convert a decoded frame of any pixel format to RGBA at natural size.
fn frame_to_image(frame: &VideoFrame, info: MediaInfo) -> Result<RgbaImage, ExtractionError> {
    let mut scaler = ScalingContext::get(
        frame.format(),
        frame.width(),
        frame.height(),
        Pixel::RGBA,
        info.width,
        info.height,
        ScalingFlags::BILINEAR,
    )?;

    let mut rgba_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgba_frame)?;

    let buffer = conversion::frame_to_buffer(&rgba_frame, info.width, info.height, 4);
    RgbaImage::from_raw(info.width, info.height, buffer).ok_or_else(|| {
        ExtractionError::DecodeError(
            "Failed to construct RGBA image from decoded frame data".to_string(),
        )
    })
}
