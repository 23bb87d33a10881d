//! Render targets for captured frames.
//!
//! A [`RenderTarget`] is the drawing surface a decoded frame is painted into
//! before being encoded as PNG. It is always sized to the video's natural
//! dimensions.

use image::{
    ExtendedColorType, ImageEncoder, RgbaImage, codecs::png::PngEncoder,
    imageops::FilterType,
};

use crate::error::ExtractionError;

/// An RGBA drawing surface sized to a video's natural resolution.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    canvas: RgbaImage,
}

impl RenderTarget {
    /// Allocate a transparent target of `width` × `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::RenderContextUnavailable`] if either
    /// dimension is zero or the area exceeds `max_pixels`.
    pub fn allocate(width: u32, height: u32, max_pixels: u64) -> Result<Self, ExtractionError> {
        if width == 0 || height == 0 {
            return Err(ExtractionError::RenderContextUnavailable(format!(
                "video reports an empty frame size ({width}x{height})"
            )));
        }

        let pixels = u64::from(width) * u64::from(height);
        if pixels > max_pixels {
            return Err(ExtractionError::RenderContextUnavailable(format!(
                "{width}x{height} exceeds the {max_pixels} pixel render limit"
            )));
        }

        Ok(Self {
            canvas: RgbaImage::new(width, height),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Paint `frame` over the whole target.
    ///
    /// Frames that already match the target size are copied as-is; anything
    /// else is stretched to fill it.
    pub fn draw(&mut self, frame: &RgbaImage) {
        if frame.dimensions() == self.canvas.dimensions() {
            self.canvas.copy_from_slice(frame.as_raw());
        } else {
            self.canvas = image::imageops::resize(
                frame,
                self.canvas.width(),
                self.canvas.height(),
                FilterType::Triangle,
            );
        }
    }

    /// Borrow the target's pixels.
    pub fn as_image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Encode the target as a PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExtractionError> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer).write_image(
            self.canvas.as_raw(),
            self.canvas.width(),
            self.canvas.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(buffer)
    }
}
