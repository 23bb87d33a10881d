//! Storyboard records and text exports.
//!
//! A generative service answers a storyboard request with a JSON array of
//! [`Shot`] records. This module parses that answer and renders it into the
//! downloadable text files a director works from: a markdown shot list and
//! a plain-text prompt sheet, each for regular shots and for transition
//! shots, headed by the settings that produced them.
//!
//! # Example
//!
//! ```
//! use shotframe::storyboard::{self, ExportKind, GenerationSettings};
//!
//! let response = r#"[{
//!     "shotNumber": 1,
//!     "timestamp": "00:00 - 00:02",
//!     "cameraAngle": "Wide, eye level",
//!     "shotDescription": "The singer walks out of the fog.",
//!     "lighting": "Backlit haze",
//!     "location": "Empty warehouse",
//!     "videoPrompt": "A singer emerges from fog, dolly in, cinematic lighting"
//! }]"#;
//!
//! let shots = storyboard::parse_shot_list(response)?;
//! let settings = GenerationSettings::new(storyboard::TRANSITION_SETTINGS_TITLE)
//!     .entry("Transition Length", "2 seconds");
//! let markdown = ExportKind::TransitionShots.render(&settings, &shots);
//! assert!(markdown.contains("## Transition Shot 1 (00:00 - 00:02)"));
//! # Ok::<(), shotframe::storyboard::StoryboardError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing or exporting storyboards.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoryboardError {
    /// The service's answer was not a JSON array of shots.
    #[error("The AI returned an invalid response. Please try again. ({0})")]
    InvalidResponse(#[from] serde_json::Error),

    /// An export kind name was not recognised.
    #[error("Unknown export format {0:?}")]
    UnknownExport(String),
}

/// One timed segment of a music video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    /// Sequential shot number, starting at 1.
    pub shot_number: u32,
    /// Time range, e.g. `"00:06 - 00:12"`.
    pub timestamp: String,
    /// Shot type and angle.
    pub camera_angle: String,
    /// Action, scenery, and performance.
    pub shot_description: String,
    /// Lighting style.
    pub lighting: String,
    /// Setting of the shot.
    pub location: String,
    /// Still-image generation prompt (regular shots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Video generation prompt (transition shots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_prompt: Option<String>,
}

/// Parse the service's JSON answer into shots.
///
/// Surrounding whitespace is ignored.
pub fn parse_shot_list(text: &str) -> Result<Vec<Shot>, StoryboardError> {
    let shots: Vec<Shot> = serde_json::from_str(text.trim()).inspect_err(|error| {
        log::error!("Failed to parse shot list response: {error}");
    })?;
    log::debug!("Parsed {} shot(s)", shots.len());
    Ok(shots)
}

/// Frame orientation of the finished video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// 16:9.
    #[default]
    Horizontal,
    /// 9:16.
    Vertical,
}

impl VideoFormat {
    /// Human-readable label used in export headers.
    pub fn label(self) -> &'static str {
        match self {
            VideoFormat::Horizontal => "Horizontal 16:9",
            VideoFormat::Vertical => "Vertical 9:16",
        }
    }
}

impl Display for VideoFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// Header title for regular storyboard exports.
pub const SETTINGS_TITLE: &str = "MV Director AI - Generation Settings";

/// Header title for transition storyboard exports.
pub const TRANSITION_SETTINGS_TITLE: &str = "MV Director AI - Transition Generation Settings";

/// Ordered label/value pairs describing how a storyboard was generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct GenerationSettings {
    title: String,
    entries: Vec<(String, String)>,
}

impl GenerationSettings {
    /// Start a header with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Append a `label: value` entry.
    pub fn entry(mut self, label: impl Into<String>, value: impl Display) -> Self {
        self.entries.push((label.into(), value.to_string()));
        self
    }

    /// Append an entry naming an input file, or `N/A` when absent.
    pub fn file_entry(self, label: impl Into<String>, file_name: Option<&str>) -> Self {
        self.entry(label, file_name.unwrap_or("N/A"))
    }

    /// Header title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render as a markdown heading and bullet list, closed by a rule.
    pub fn markdown_header(&self) -> String {
        let mut header = format!("# {}\n\n", self.title);
        for (label, value) in &self.entries {
            header.push_str(&format!("- **{label}**: {value}\n"));
        }
        header.push_str("\n---\n\n");
        header
    }

    /// Render as plain `Label: value` lines framed by `=` rules one column
    /// wider than the title.
    pub fn text_header(&self) -> String {
        let rule = "=".repeat(self.title.chars().count() + 1);
        let mut header = format!("{}\n{rule}\n", self.title);
        for (label, value) in &self.entries {
            header.push_str(&format!("{label}: {value}\n"));
        }
        header.push_str(&rule);
        header.push_str("\n\n");
        header
    }
}

/// The downloadable exports of a storyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Markdown shot list with image prompts.
    ShotList,
    /// Plain-text image prompts, one block per shot.
    ImagePrompts,
    /// Markdown transition shots with video prompts.
    TransitionShots,
    /// Plain-text video prompts, one block per shot.
    VideoPrompts,
}

impl ExportKind {
    /// Render `shots` under `settings`.
    pub fn render(self, settings: &GenerationSettings, shots: &[Shot]) -> String {
        match self {
            ExportKind::ShotList => {
                settings.markdown_header() + &shot_sections(shots, "Shot", "Image Prompt", |shot| {
                    shot.image_prompt.as_deref()
                })
            }
            ExportKind::TransitionShots => {
                settings.markdown_header()
                    + &shot_sections(shots, "Transition Shot", "AI Video Prompt", |shot| {
                        shot.video_prompt.as_deref()
                    })
            }
            ExportKind::ImagePrompts => {
                settings.text_header() + &prompt_blocks(shots, |shot| shot.image_prompt.as_deref())
            }
            ExportKind::VideoPrompts => {
                settings.text_header() + &prompt_blocks(shots, |shot| shot.video_prompt.as_deref())
            }
        }
    }

    /// Download file name for this export.
    ///
    /// `base` is the song file stem for regular exports and the transition
    /// stem (see [`transition_base_name`]) for transition exports.
    pub fn file_name(self, base: &str) -> String {
        match self {
            ExportKind::ShotList => format!("{base}-shot-list.md"),
            ExportKind::ImagePrompts => format!("{base}-image-prompts.txt"),
            ExportKind::TransitionShots => format!("{base}-shots.md"),
            ExportKind::VideoPrompts => format!("{base}-prompts.txt"),
        }
    }

    /// The export's name as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::ShotList => "shot-list",
            ExportKind::ImagePrompts => "image-prompts",
            ExportKind::TransitionShots => "transition",
            ExportKind::VideoPrompts => "video-prompts",
        }
    }
}

impl FromStr for ExportKind {
    type Err = StoryboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "shot-list" | "shots" | "md" => Ok(ExportKind::ShotList),
            "image-prompts" => Ok(ExportKind::ImagePrompts),
            "transition" | "transition-shots" => Ok(ExportKind::TransitionShots),
            "video-prompts" | "prompts" => Ok(ExportKind::VideoPrompts),
            _ => Err(StoryboardError::UnknownExport(value.to_string())),
        }
    }
}

/// Base name shared by transition exports, e.g. `scene 3 - 4 transition`.
pub fn transition_base_name(from_shot: u32, to_shot: u32) -> String {
    format!("scene {from_shot} - {to_shot} transition")
}

fn shot_sections(
    shots: &[Shot],
    heading: &str,
    prompt_heading: &str,
    prompt: impl Fn(&Shot) -> Option<&str>,
) -> String {
    shots
        .iter()
        .map(|shot| {
            format!(
                "## {heading} {} ({})\n\n\
                 - **Location:** {}\n\
                 - **Camera:** {}\n\
                 - **Lighting:** {}\n\
                 - **Description:** {}\n\n\
                 ### {prompt_heading}\n```\n{}\n```\n",
                shot.shot_number,
                shot.timestamp,
                shot.location,
                shot.camera_angle,
                shot.lighting,
                shot.shot_description,
                prompt(shot).unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn prompt_blocks(shots: &[Shot], prompt: impl Fn(&Shot) -> Option<&str>) -> String {
    shots
        .iter()
        .filter_map(|shot| prompt(shot))
        .collect::<Vec<_>>()
        .join("\n\n")
}
