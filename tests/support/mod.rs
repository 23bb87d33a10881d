//! A scripted decode backend for driving the extractor without FFmpeg.
//!
//! Each attached pipeline replays a fixed [`Script`]: signals to emit when
//! attached and when a seek is issued, optionally after a delay on the
//! (paused) tokio clock. Everything the extractor does to the pipeline is
//! written to a shared [`Record`].

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use image::{Rgba, RgbaImage};
use shotframe::{
    DecodeBackend, DecodePipeline, ExtractionError, MediaInfo, MediaSignal, PipelineHints,
    SignalSender, VideoSource,
};

pub const FILL: [u8; 4] = [200, 40, 90, 255];

/// Signals sent per tick by a flooding pipeline, more than one poll of the
/// extractor drains.
pub const FLOOD_BURST: usize = 512;

/// A signal the pipeline emits, now or after a delay.
#[derive(Debug, Clone)]
pub enum Reply {
    Now(MediaSignal),
    After(Duration, MediaSignal),
}

/// How a scripted pipeline behaves.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub attach_error: Option<String>,
    pub on_attach: Vec<Reply>,
    pub on_seek: Vec<Reply>,
    pub seek_error: bool,
    pub play_error: bool,
    pub snapshot_error: bool,
    /// Size of the frame handed over on capture. Defaults to the size in
    /// the first attach metadata.
    pub frame_size: Option<(u32, u32)>,
    /// Drop the signal sender as soon as the attach replies are sent.
    pub hang_up: bool,
    /// Send [`FLOOD_BURST`] stray `Seeked` signals every tick of this
    /// length, advancing the paused clock between bursts, until the session
    /// closes.
    pub flood: Option<Duration>,
}

impl Script {
    /// Metadata on attach, `Seeked` on seek.
    pub fn healthy(info: MediaInfo) -> Self {
        Self {
            on_attach: vec![Reply::Now(MediaSignal::MetadataLoaded(info))],
            on_seek: vec![Reply::Now(MediaSignal::Seeked)],
            ..Self::default()
        }
    }

    /// Never reports anything.
    pub fn stalled() -> Self {
        Self::default()
    }

    fn frame_size(&self) -> (u32, u32) {
        self.frame_size
            .or_else(|| {
                self.on_attach.iter().find_map(|reply| match reply {
                    Reply::Now(MediaSignal::MetadataLoaded(info))
                    | Reply::After(_, MediaSignal::MetadataLoaded(info)) => {
                        Some((info.width, info.height))
                    }
                    _ => None,
                })
            })
            .unwrap_or((1, 1))
    }
}

/// Everything the extractor did to the backend.
#[derive(Debug, Default)]
pub struct Record {
    pub attaches: AtomicUsize,
    pub pipelines: AtomicUsize,
    pub locations: Mutex<Vec<PathBuf>>,
    pub contents: Mutex<Vec<Vec<u8>>>,
    pub hints: Mutex<Vec<PipelineHints>>,
    pub senders: Mutex<Vec<SignalSender>>,
    pub seeks: Mutex<Vec<Duration>>,
    pub plays: AtomicUsize,
    pub snapshots: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Record {
    pub fn attaches(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn pipelines(&self) -> usize {
        self.pipelines.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn locations(&self) -> Vec<PathBuf> {
        self.locations.lock().unwrap().clone()
    }

    pub fn senders(&self) -> Vec<SignalSender> {
        self.senders.lock().unwrap().clone()
    }

    /// Assert every session was torn down exactly once and left nothing
    /// behind.
    pub fn assert_released(&self) {
        assert_eq!(self.closes(), self.pipelines(), "every pipeline closed once");
        for location in self.locations() {
            assert!(
                !location.exists(),
                "temporary resource {} still exists",
                location.display()
            );
        }
        for sender in self.senders() {
            assert!(sender.is_closed(), "signal listener still attached");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Script,
    record: Arc<Record>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            record: Arc::new(Record::default()),
        }
    }

    pub fn record(&self) -> Arc<Record> {
        Arc::clone(&self.record)
    }
}

impl DecodeBackend for ScriptedBackend {
    fn attach(
        &self,
        location: &Path,
        hints: PipelineHints,
        signals: SignalSender,
    ) -> Result<Box<dyn DecodePipeline>, ExtractionError> {
        self.record.attaches.fetch_add(1, Ordering::SeqCst);
        self.record
            .locations
            .lock()
            .unwrap()
            .push(location.to_path_buf());
        self.record
            .contents
            .lock()
            .unwrap()
            .push(fs::read(location).unwrap());
        self.record.hints.lock().unwrap().push(hints);

        if let Some(message) = &self.script.attach_error {
            return Err(ExtractionError::DecodeError(message.clone()));
        }

        self.record.pipelines.fetch_add(1, Ordering::SeqCst);
        deliver(&self.script.on_attach, &signals);
        if let Some(tick) = self.script.flood {
            flood(tick, signals.clone());
        }

        let signals = if self.script.hang_up {
            None
        } else {
            self.record.senders.lock().unwrap().push(signals.clone());
            Some(signals)
        };

        Ok(Box::new(ScriptedPipeline {
            script: self.script.clone(),
            record: Arc::clone(&self.record),
            signals,
        }))
    }
}

struct ScriptedPipeline {
    script: Script,
    record: Arc<Record>,
    signals: Option<SignalSender>,
}

impl DecodePipeline for ScriptedPipeline {
    fn seek(&mut self, target: Duration) -> Result<(), ExtractionError> {
        if self.script.seek_error {
            return Err(ExtractionError::DecodeError("seek refused".to_string()));
        }
        self.record.seeks.lock().unwrap().push(target);
        if let Some(signals) = &self.signals {
            deliver(&self.script.on_seek, signals);
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), ExtractionError> {
        self.record.plays.fetch_add(1, Ordering::SeqCst);
        if self.script.play_error {
            return Err(ExtractionError::DecodeError("autoplay blocked".to_string()));
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<RgbaImage, ExtractionError> {
        self.record.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.script.snapshot_error {
            return Err(ExtractionError::DecodeError("no frame decoded".to_string()));
        }
        let (width, height) = self.script.frame_size();
        Ok(RgbaImage::from_pixel(width, height, Rgba(FILL)))
    }

    fn close(&mut self) {
        self.record.closes.fetch_add(1, Ordering::SeqCst);
        self.signals = None;
    }
}

fn deliver(replies: &[Reply], signals: &SignalSender) {
    for reply in replies {
        match reply.clone() {
            Reply::Now(signal) => {
                let _ = signals.send(signal);
            }
            Reply::After(delay, signal) => {
                let signals = signals.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = signals.send(signal);
                });
            }
        }
    }
}

fn flood(tick: Duration, signals: SignalSender) {
    tokio::spawn(async move {
        loop {
            for _ in 0..FLOOD_BURST {
                if signals.send(MediaSignal::Seeked).is_err() {
                    return;
                }
            }
            tokio::time::advance(tick).await;
        }
    });
}

pub fn info(duration: Duration, width: u32, height: u32) -> MediaInfo {
    MediaInfo {
        duration,
        width,
        height,
    }
}

pub fn source(name: &str) -> VideoSource {
    VideoSource::from_bytes(name, "video/mp4", format!("bytes of {name}").into_bytes())
}
