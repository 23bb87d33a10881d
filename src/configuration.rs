//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads tunables (edge offset,
//! watchdog interval, render limits), progress callbacks, and cancellation
//! tokens through extraction methods without polluting every signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use shotframe::{CancellationToken, ExtractOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_watchdog(Duration::from_secs(30))
//!     .with_edge_offset(Duration::from_millis(40))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::PipelineHints;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Distance from either end of a clip used when computing seek targets.
pub const DEFAULT_EDGE_OFFSET: Duration = Duration::from_millis(10);

/// How long an extraction may wait for a terminal decode signal.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(10);

/// Largest render target, in pixels, that will be allocated (16K × 16K).
pub const DEFAULT_MAX_RENDER_PIXELS: u64 = 16_384 * 16_384;

/// Configuration for frame extraction.
///
/// All fields have defaults matching the reference behaviour: a 10 ms edge
/// offset, a 10 s watchdog, no progress callback, and no cancellation.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) edge_offset: Duration,
    pub(crate) watchdog: Duration,
    pub(crate) max_render_pixels: u64,
    pub(crate) hints: PipelineHints,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("edge_offset", &self.edge_offset)
            .field("watchdog", &self.watchdog)
            .field("max_render_pixels", &self.max_render_pixels)
            .field("hints", &self.hints)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            edge_offset: DEFAULT_EDGE_OFFSET,
            watchdog: DEFAULT_WATCHDOG,
            max_render_pixels: DEFAULT_MAX_RENDER_PIXELS,
            hints: PipelineHints::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set the offset from either end of the clip used for seek targets.
    #[must_use]
    pub fn with_edge_offset(mut self, offset: Duration) -> Self {
        self.edge_offset = offset;
        self
    }

    /// Set the watchdog interval.
    ///
    /// If no seek completion or decode error is observed within this
    /// interval the extraction fails with
    /// [`ExtractionError::Timeout`](crate::ExtractionError::Timeout).
    #[must_use]
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Cap the number of pixels a render target may hold.
    ///
    /// Videos whose natural size exceeds this cap fail with
    /// [`ExtractionError::RenderContextUnavailable`](crate::ExtractionError::RenderContextUnavailable).
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_render_pixels(mut self, pixels: u64) -> Self {
        self.max_render_pixels = pixels.max(1);
        self
    }

    /// Override the hints passed to the decode pipeline.
    #[must_use]
    pub fn with_hints(mut self, hints: PipelineHints) -> Self {
        self.hints = hints;
        self
    }

    /// Attach a progress callback, invoked on every stage change.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured edge offset.
    pub fn edge_offset(&self) -> Duration {
        self.edge_offset
    }

    /// The configured watchdog interval.
    pub fn watchdog(&self) -> Duration {
        self.watchdog
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
