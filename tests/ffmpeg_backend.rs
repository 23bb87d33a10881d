//! FFmpeg backend integration tests.
//!
//! Most of these decode `tests/fixtures/sample_video.mp4` and are skipped
//! when the fixture is absent. The generated-clip tests encode their own
//! short gradient clip and only skip if FFmpeg has no MPEG-4 encoder.

use std::{path::Path, time::Duration};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    format::Pixel,
    frame::Video as VideoFrame,
};
use shotframe::{
    ExtractOptions, ExtractionError, ExtractedFrame, FfmpegLogLevel, FrameExtractor,
    FramePosition, TransitionFrames, VideoSource,
};
use tempfile::TempDir;

const CLIP_WIDTH: u32 = 64;
const CLIP_HEIGHT: u32 = 48;
const CLIP_FPS: i32 = 25;
const CLIP_FRAMES: i64 = 25;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_source() -> Option<VideoSource> {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return None;
    }
    shotframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    Some(VideoSource::open(path).expect("open sample video"))
}

/// Encode a one-second clip that fades from black to near white, one luma
/// step per frame. Returns `None` when no MPEG-4 encoder is built in.
fn generated_clip() -> Option<(TempDir, VideoSource)> {
    ffmpeg_next::init().expect("init ffmpeg");
    shotframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    let codec = ffmpeg_next::encoder::find(Id::MPEG4)?;

    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("fade.avi");
    let mut output = ffmpeg_next::format::output(&path).expect("open output");

    let mut stream = output.add_stream(codec).expect("add stream");
    let stream_index = stream.index();
    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .expect("codec context")
        .encoder()
        .video()
        .expect("video encoder");
    let time_base = Rational::new(1, CLIP_FPS);
    encoder.set_width(CLIP_WIDTH);
    encoder.set_height(CLIP_HEIGHT);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(time_base);
    encoder.set_frame_rate(Some(Rational::new(CLIP_FPS, 1)));
    let mut encoder = encoder.open_as(codec).expect("open encoder");
    stream.set_parameters(&encoder);
    output.write_header().expect("write header");
    let stream_time_base = output
        .stream(stream_index)
        .expect("output stream")
        .time_base();

    for index in 0..CLIP_FRAMES {
        let mut frame = VideoFrame::new(Pixel::YUV420P, CLIP_WIDTH, CLIP_HEIGHT);
        frame.data_mut(0).fill(16 + (index as u8) * 9);
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame.set_pts(Some(index));
        encoder.send_frame(&frame).expect("send frame");

        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, stream_time_base);
            packet.write_interleaved(&mut output).expect("write packet");
        }
    }

    encoder.send_eof().expect("send eof");
    let mut packet = Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(time_base, stream_time_base);
        packet.write_interleaved(&mut output).expect("write flush packet");
    }
    output.write_trailer().expect("write trailer");

    let source = VideoSource::open(&path).expect("open generated clip");
    Some((directory, source))
}

fn mean_red(frame: &ExtractedFrame) -> f64 {
    let image = frame.to_image().expect("decode png").to_rgba8();
    let total: u64 = image.pixels().map(|pixel| u64::from(pixel.0[0])).sum();
    total as f64 / f64::from(image.width() * image.height())
}

// ── Generated clip ─────────────────────────────────────────────────

#[tokio::test]
async fn generated_clip_start_frame_is_dark() {
    let Some((_directory, source)) = generated_clip() else {
        return;
    };

    let frame = FrameExtractor::new()
        .extract_frame(&source, FramePosition::Start)
        .await
        .expect("first frame");

    assert_eq!((frame.width, frame.height), (CLIP_WIDTH, CLIP_HEIGHT));
    assert_eq!(frame.timestamp, Duration::from_millis(10));
    let mean = mean_red(&frame);
    assert!(mean < 80.0, "start frame too bright: {mean}");
}

#[tokio::test]
async fn generated_clip_end_frame_falls_back_to_last_decoded() {
    let Some((_directory, source)) = generated_clip() else {
        return;
    };

    // The target (0.99s) lies past the last frame's timestamp (0.96s).
    let frame = FrameExtractor::new()
        .extract_frame(&source, FramePosition::End)
        .await
        .expect("last frame");

    assert_eq!((frame.width, frame.height), (CLIP_WIDTH, CLIP_HEIGHT));
    assert!(frame.timestamp > Duration::from_millis(900));
    let mean = mean_red(&frame);
    assert!(mean > 160.0, "end frame too dark: {mean}");
}

#[tokio::test]
async fn generated_clip_transition_pair() {
    let Some((_directory, source)) = generated_clip() else {
        return;
    };

    let frames = TransitionFrames::extract(&FrameExtractor::new(), &source, &source).await;
    let last = frames.scene1_last.as_ref().expect("scene 1 last frame");
    let first = frames.scene2_first.as_ref().expect("scene 2 first frame");
    assert!(mean_red(last) > mean_red(first));
}

// ── Sample fixture ─────────────────────────────────────────────────

#[tokio::test]
async fn extracts_first_frame() {
    let Some(source) = sample_source() else {
        return;
    };

    let frame = FrameExtractor::new()
        .extract_frame(&source, FramePosition::Start)
        .await
        .expect("first frame");

    assert!(frame.width > 0 && frame.height > 0);
    assert_eq!(frame.timestamp, Duration::from_millis(10));

    let image = frame.to_image().expect("decode png");
    assert_eq!((image.width(), image.height()), (frame.width, frame.height));
}

#[tokio::test]
async fn extracts_last_frame() {
    let Some(source) = sample_source() else {
        return;
    };

    let frame = FrameExtractor::new()
        .extract_frame(&source, FramePosition::End)
        .await
        .expect("last frame");

    assert!(frame.timestamp > Duration::from_millis(10));
    assert!(!frame.png.is_empty());
}

#[tokio::test]
async fn first_and_last_frames_share_dimensions() {
    let Some(source) = sample_source() else {
        return;
    };

    let extractor = FrameExtractor::new();
    let first = extractor
        .extract_frame(&source, FramePosition::Start)
        .await
        .expect("first frame");
    let last = extractor
        .extract_frame(&source, FramePosition::End)
        .await
        .expect("last frame");

    assert_eq!((first.width, first.height), (last.width, last.height));
    assert_ne!(first.png, last.png, "first and last frames should differ");
}

#[tokio::test]
async fn transition_frames_are_written_to_disk() {
    let Some(source) = sample_source() else {
        return;
    };

    let frames = TransitionFrames::extract(&FrameExtractor::new(), &source, &source).await;
    assert!(frames.is_complete());

    let directory = tempfile::tempdir().expect("tempdir");
    let written = frames.save_all(directory.path()).expect("save");
    assert_eq!(written.len(), 2);
    assert!(directory.path().join(shotframe::SCENE1_LAST_FRAME_FILE_NAME).exists());
    assert!(directory.path().join(shotframe::SCENE2_FIRST_FRAME_FILE_NAME).exists());
}

#[tokio::test]
async fn small_render_limit_is_reported() {
    let Some(source) = sample_source() else {
        return;
    };

    let extractor =
        FrameExtractor::new().with_options(ExtractOptions::new().with_max_render_pixels(1));
    let error = extractor
        .extract_frame(&source, FramePosition::Start)
        .await
        .unwrap_err();

    assert!(matches!(error, ExtractionError::RenderContextUnavailable(_)));
}

#[tokio::test]
async fn garbage_input_is_a_decode_error() {
    let source = VideoSource::from_bytes(
        "not-a-video.mp4",
        "video/mp4",
        b"this is definitely not an mp4 container".to_vec(),
    );

    let error = FrameExtractor::new()
        .extract_frame(&source, FramePosition::Start)
        .await
        .unwrap_err();

    assert!(
        matches!(error, ExtractionError::DecodeError(_)),
        "unexpected error: {error:?}"
    );
}
