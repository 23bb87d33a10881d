//! Internal conversion helpers shared by the FFmpeg backend.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy the first plane of a packed video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width ×
/// `bytes_per_pixel`). The padding is stripped so the result can be handed
/// to [`image::RgbaImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Convert a [`Duration`] to a container seek timestamp in AV_TIME_BASE
/// (microseconds), saturating at `i64::MAX`.
///
/// `Input::seek` goes through `avformat_seek_file` with `stream_index = -1`,
/// which expects AV_TIME_BASE units rather than the stream time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Pick the natural duration of a video.
///
/// Prefers the container duration (AV_TIME_BASE microseconds) and falls
/// back to the stream duration in its own time base. Unknown durations are
/// reported as zero.
pub(crate) fn natural_duration(
    container_microseconds: i64,
    stream_duration: i64,
    stream_time_base: Rational,
) -> Duration {
    if container_microseconds > 0 {
        return Duration::from_micros(container_microseconds as u64);
    }

    let seconds = pts_to_seconds(stream_duration, stream_time_base);
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}
