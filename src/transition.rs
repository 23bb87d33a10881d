//! Boundary frames for scene transitions.
//!
//! Designing a transition between two shots starts from the last frame of
//! the outgoing clip and the first frame of the incoming one.
//! [`TransitionFrames::extract`] pulls both concurrently. The two
//! extractions are independent: one timing out or failing to decode never
//! affects the other.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    backend::DecodeBackend,
    error::ExtractionError,
    extractor::FrameExtractor,
    frame::ExtractedFrame,
    position::FramePosition,
    source::VideoSource,
};

/// Download name for the outgoing clip's last frame.
pub const SCENE1_LAST_FRAME_FILE_NAME: &str = "scene1_last_frame.png";

/// Download name for the incoming clip's first frame.
pub const SCENE2_FIRST_FRAME_FILE_NAME: &str = "scene2_first_frame.png";

/// The two boundary frames of a transition, each with its own outcome.
#[derive(Debug)]
pub struct TransitionFrames {
    /// Last frame of scene 1 (the clip being transitioned from).
    pub scene1_last: Result<ExtractedFrame, ExtractionError>,
    /// First frame of scene 2 (the clip being transitioned to).
    pub scene2_first: Result<ExtractedFrame, ExtractionError>,
}

impl TransitionFrames {
    /// Extract the last frame of `scene1` and the first frame of `scene2`
    /// concurrently.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shotframe::{FrameExtractor, TransitionFrames, VideoSource};
    ///
    /// # async fn example() -> Result<(), shotframe::ExtractionError> {
    /// let extractor = FrameExtractor::new();
    /// let scene1 = VideoSource::open("scene1.mp4")?;
    /// let scene2 = VideoSource::open("scene2.mp4")?;
    ///
    /// let frames = TransitionFrames::extract(&extractor, &scene1, &scene2).await;
    /// for path in frames.save_all("out")? {
    ///     println!("saved {}", path.display());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn extract<B: DecodeBackend>(
        extractor: &FrameExtractor<B>,
        scene1: &VideoSource,
        scene2: &VideoSource,
    ) -> Self {
        let (scene1_last, scene2_first) = tokio::join!(
            extractor.extract_frame(scene1, FramePosition::End),
            extractor.extract_frame(scene2, FramePosition::Start),
        );

        Self {
            scene1_last,
            scene2_first,
        }
    }

    /// `true` if both frames were extracted.
    pub fn is_complete(&self) -> bool {
        self.scene1_last.is_ok() && self.scene2_first.is_ok()
    }

    /// Write every successfully extracted frame into `directory` under its
    /// suggested file name, creating the directory if needed.
    ///
    /// Returns the paths written. Failed extractions are skipped.
    pub fn save_all<P: AsRef<Path>>(&self, directory: P) -> Result<Vec<PathBuf>, ExtractionError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;

        let mut written = Vec::new();
        for (result, file_name) in [
            (&self.scene1_last, SCENE1_LAST_FRAME_FILE_NAME),
            (&self.scene2_first, SCENE2_FIRST_FRAME_FILE_NAME),
        ] {
            if let Ok(frame) = result {
                let path = directory.join(file_name);
                frame.save(&path)?;
                written.push(path);
            }
        }

        Ok(written)
    }
}
