//! Which end of a clip to extract.
//!
//! [`FramePosition`] selects the first or last frame of a video, and
//! [`FramePosition::target_timestamp`] turns that choice into a concrete seek
//! target. Seeking to exactly zero tends to yield a black pre-roll frame, and
//! seeking to exactly the duration is refused by some decoders, so both ends
//! are pulled inwards by a small edge offset.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    time::Duration,
};

use crate::error::ExtractionError;

/// Selects the first or last decodable frame of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePosition {
    /// The first real frame, just after time zero.
    Start,
    /// The last decodable frame, just before the end.
    End,
}

impl FramePosition {
    /// Compute the seek target for a video of the given `duration`.
    ///
    /// - `Start` → `edge_offset`.
    /// - `End` → `duration - edge_offset` when `duration > edge_offset`,
    ///   otherwise zero.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use shotframe::FramePosition;
    ///
    /// let offset = Duration::from_millis(10);
    /// let ten_seconds = Duration::from_secs(10);
    /// assert_eq!(FramePosition::Start.target_timestamp(ten_seconds, offset), offset);
    /// assert_eq!(
    ///     FramePosition::End.target_timestamp(ten_seconds, offset),
    ///     Duration::from_millis(9_990),
    /// );
    /// ```
    pub fn target_timestamp(self, duration: Duration, edge_offset: Duration) -> Duration {
        match self {
            FramePosition::Start => edge_offset,
            FramePosition::End if duration > edge_offset => duration - edge_offset,
            FramePosition::End => Duration::ZERO,
        }
    }

    /// The selector string accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            FramePosition::Start => "start",
            FramePosition::End => "end",
        }
    }
}

impl Display for FramePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FramePosition {
    type Err = ExtractionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(FramePosition::Start),
            "end" => Ok(FramePosition::End),
            other => Err(ExtractionError::InvalidPosition(other.to_string())),
        }
    }
}
