//! Extracted frames.

use std::{fs, path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};

use crate::{error::ExtractionError, position::FramePosition};

/// A single decoded frame, encoded as PNG.
///
/// `width` and `height` always equal the source video's natural decoded
/// dimensions at the moment of capture.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExtractedFrame {
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Which end of the clip this frame came from.
    pub position: FramePosition,
    /// The seek target that produced this frame.
    pub timestamp: Duration,
}

impl ExtractedFrame {
    /// Decode the PNG back into an image.
    pub fn to_image(&self) -> Result<DynamicImage, ExtractionError> {
        Ok(image::load_from_memory_with_format(&self.png, ImageFormat::Png)?)
    }

    /// Write the PNG bytes to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ExtractionError> {
        fs::write(path, &self.png)?;
        Ok(())
    }

    /// A download name for this frame, e.g. `clip_last_frame.png`.
    pub fn suggested_file_name(&self, prefix: &str) -> String {
        let which = match self.position {
            FramePosition::Start => "first",
            FramePosition::End => "last",
        };
        format!("{prefix}_{which}_frame.png")
    }

    /// The PNG as a `data:` URL, ready to embed in a page or request body.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}
