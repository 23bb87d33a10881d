//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing the stages of a
//! frame extraction (what a UI shows as an "extracting…" indicator), and
//! [`CancellationToken`] for cooperative, caller-initiated cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shotframe::{
//!     CancellationToken, ExtractOptions, FramePosition, FrameExtractor,
//!     ProgressCallback, ProgressInfo, VideoSource,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] after {:?}", info.stage, info.elapsed);
//!     }
//! }
//!
//! # async fn example() -> Result<(), shotframe::ExtractionError> {
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//!
//! let source = VideoSource::open("scene1.mp4")?;
//! let frame = FrameExtractor::new()
//!     .extract_frame_with_options(&source, FramePosition::End, &options)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::session::ReadinessStage;

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The stage the decode session just entered.
    pub stage: ReadinessStage,
    /// Wall-clock time since the extraction started.
    pub elapsed: Duration,
    /// The seek target, once it is known.
    pub target: Option<Duration>,
}

/// Trait for receiving stage updates during extraction.
///
/// Implementations must be [`Send`] and [`Sync`] because the same callback
/// may be shared between concurrent extractions.
///
/// Progress callbacks are **infallible**; they observe but cannot halt the
/// extraction. Use [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called each time the decode session changes stage.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

#[derive(Debug, Default)]
struct CancellationState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation token.
///
/// Clone this token and share it between tasks; call
/// [`cancel`](CancellationToken::cancel) from anywhere to abandon the
/// extractions it was attached to. An in-flight extraction observes the
/// cancellation immediately, tears down its decode session, and fails with
/// [`ExtractionError::Cancelled`](crate::ExtractionError::Cancelled).
///
/// # Example
///
/// ```
/// use shotframe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<CancellationState>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// All clones of this token observe the cancellation.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Wait until cancellation is requested.
    ///
    /// Returns immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent `cancel`
            // between the check and the await is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Tracks elapsed time and forwards stage changes to the callback.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    start_time: Instant,
    target: Option<Duration>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>) -> Self {
        Self {
            callback,
            start_time: Instant::now(),
            target: None,
        }
    }

    pub(crate) fn set_target(&mut self, target: Duration) {
        self.target = Some(target);
    }

    pub(crate) fn report(&self, stage: ReadinessStage) {
        let info = ProgressInfo {
            stage,
            elapsed: self.start_time.elapsed(),
            target: self.target,
        };
        self.callback.on_progress(&info);
    }
}
