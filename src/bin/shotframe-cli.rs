use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use shotframe::{
    ExportKind, ExtractOptions, ExtractedFrame, ExtractionError, FfmpegLogLevel, FrameExtractor,
    FramePosition, GenerationSettings, ProgressCallback, ProgressInfo, ReadinessStage,
    TransitionFrames, VideoSource, storyboard,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotframe extract scene1.mp4 --position end --out scene1_last_frame.png\n  shotframe transition scene1.mp4 scene2.mp4 --out-dir frames\n  shotframe export shots.json --format shot-list --base my-song\n  shotframe completions zsh > _shotframe";

#[derive(Debug, Parser)]
#[command(
    name = "shotframe",
    version,
    about = "Extract boundary frames from video clips and export storyboards",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Watchdog interval in seconds (or mm:ss).
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Distance from either end of a clip, in seconds.
    #[arg(long, global = true)]
    offset: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the first or last frame of a video as PNG.
    #[command(
        about = "Extract a boundary frame",
        after_help = "Examples:\n  shotframe extract clip.mp4 --position start --out first.png\n  shotframe extract clip.mp4 --position end --out last.png --timeout 30 --json"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Which frame to extract: start | end.
        #[arg(long, default_value = "end")]
        position: String,
        /// Output PNG path. Defaults to `<stem>_<first|last>_frame.png`.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract the last frame of scene 1 and the first frame of scene 2.
    #[command(
        about = "Extract both sides of a transition",
        after_help = "Examples:\n  shotframe transition scene1.mp4 scene2.mp4 --out-dir frames"
    )]
    Transition {
        /// Video of the shot being transitioned from.
        scene1: PathBuf,
        /// Video of the shot being transitioned to.
        scene2: PathBuf,
        /// Directory for `scene1_last_frame.png` and `scene2_first_frame.png`.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Render a shot list JSON file into a downloadable export.
    #[command(
        about = "Export a storyboard",
        after_help = "Examples:\n  shotframe export shots.json --format shot-list --base my-song --setting \"Song Length=3:45\"\n  shotframe export transition.json --format video-prompts --from-shot 3 --to-shot 4"
    )]
    Export {
        /// JSON array of shot records.
        input: PathBuf,
        /// Export kind: shot-list | image-prompts | transition | video-prompts.
        #[arg(long, default_value = "shot-list")]
        format: String,
        /// Output path. Defaults to the export's download name.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Base name for regular exports (usually the song file stem).
        #[arg(long, default_value = "mv")]
        base: String,
        /// Shot the transition starts from.
        #[arg(long)]
        from_shot: Option<u32>,
        /// Shot the transition leads to.
        #[arg(long)]
        to_shot: Option<u32>,
        /// Header title.
        #[arg(long)]
        title: Option<String>,
        /// Header entry as `Label=Value`; repeatable.
        #[arg(long = "setting")]
        settings: Vec<String>,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds, trimmed);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let minutes = parts[0].parse::<u64>()?;
    let seconds = parts[1].parse::<f64>()?;
    seconds_to_duration(minutes as f64 * 60.0 + seconds, trimmed)
}

fn seconds_to_duration(seconds: f64, raw: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() {
        return Err(format!("invalid time value: {raw}").into());
    }
    Duration::try_from_secs_f64(seconds.max(0.0)).map_err(|error| {
        Box::<dyn std::error::Error>::from(format!("time value out of range: {raw} ({error})"))
    })
}

fn parse_setting(value: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let (label, setting) = value
        .split_once('=')
        .ok_or(format!("setting must look like Label=Value: {value}"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("setting label cannot be empty: {value}").into());
    }
    Ok((label.to_string(), setting.trim().to_string()))
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        shotframe::set_ffmpeg_log_level(parsed);
    } else if !global.verbose {
        shotframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    }

    Ok(())
}

fn extract_options(global: &GlobalOptions) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    let mut options = ExtractOptions::new();

    if let Some(timeout) = &global.timeout {
        options = options.with_watchdog(parse_timecode(timeout)?);
    }

    if let Some(offset) = &global.offset {
        options = options.with_edge_offset(parse_timecode(offset)?);
    }

    Ok(options)
}

/// Shows the "extracting…" indicator while an extraction is pending.
struct SpinnerProgress {
    bar: ProgressBar,
    label: String,
}

impl SpinnerProgress {
    fn new(label: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            label: label.into(),
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let detail = match (info.stage, info.target) {
            (ReadinessStage::Uninitialized, _) => "loading metadata".to_string(),
            (ReadinessStage::MetadataLoaded, _) => "metadata loaded".to_string(),
            (ReadinessStage::Seeking, Some(target)) => {
                format!("seeking to {:.3}s", target.as_secs_f64())
            }
            (ReadinessStage::Seeking, None) => "seeking".to_string(),
            (ReadinessStage::Ready, _) => "capturing".to_string(),
            (ReadinessStage::Errored, _) => "failed".to_string(),
        };
        self.bar
            .set_message(format!("Extracting {}... {detail}", self.label));
    }
}

fn frame_json(frame: &ExtractedFrame, path: &Path) -> serde_json::Value {
    json!({
        "path": path.display().to_string(),
        "position": frame.position.as_str(),
        "timestamp_seconds": frame.timestamp.as_secs_f64(),
        "width": frame.width,
        "height": frame.height,
        "bytes": frame.png.len(),
    })
}

fn error_json(error: &ExtractionError) -> serde_json::Value {
    json!({
        "error": error.kind(),
        "message": error.to_string(),
    })
}

async fn run_extract(
    global: &GlobalOptions,
    input: PathBuf,
    position: String,
    out: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let position: FramePosition = position.parse()?;
    let source = VideoSource::open(&input)?;

    let spinner = Arc::new(SpinnerProgress::new(format!("{position} frame")));
    let options = extract_options(global)?.with_progress(spinner.clone());
    let result = FrameExtractor::new()
        .extract_frame_with_options(&source, position, &options)
        .await;
    spinner.finish();

    let frame = match result {
        Ok(frame) => frame,
        Err(error) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&error_json(&error))?);
            }
            return Err(error.into());
        }
    };

    let out = out.unwrap_or_else(|| PathBuf::from(frame.suggested_file_name(source.stem_or("frame"))));
    ensure_writable_path(&out, global.overwrite)?;
    frame.save(&out)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&frame_json(&frame, &out))?);
    } else {
        println!(
            "{} {} ({}x{} at {:.3}s)",
            "saved".green().bold(),
            out.display(),
            frame.width,
            frame.height,
            frame.timestamp.as_secs_f64()
        );
    }

    Ok(())
}

async fn run_transition(
    global: &GlobalOptions,
    scene1: PathBuf,
    scene2: PathBuf,
    out_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene1 = VideoSource::open(&scene1)?;
    let scene2 = VideoSource::open(&scene2)?;

    for name in [
        shotframe::SCENE1_LAST_FRAME_FILE_NAME,
        shotframe::SCENE2_FIRST_FRAME_FILE_NAME,
    ] {
        ensure_writable_path(&out_dir.join(name), global.overwrite)?;
    }

    let spinner = Arc::new(SpinnerProgress::new("transition frames"));
    let extractor = FrameExtractor::new()
        .with_options(extract_options(global)?.with_progress(spinner.clone()));
    let frames = TransitionFrames::extract(&extractor, &scene1, &scene2).await;
    spinner.finish();

    for path in frames.save_all(&out_dir)? {
        println!("{} {}", "saved".green().bold(), path.display());
    }

    for (label, result) in [
        ("scene 1 last frame", &frames.scene1_last),
        ("scene 2 first frame", &frames.scene2_first),
    ] {
        if let Err(error) = result {
            eprintln!("{} {label}: {error}", "failed:".red().bold());
        }
    }

    if frames.is_complete() {
        Ok(())
    } else {
        Err("one or more transition frames could not be extracted".into())
    }
}

fn export_header(
    transition: bool,
    title: Option<String>,
    from_shot: Option<u32>,
    to_shot: Option<u32>,
    settings: &[String],
) -> Result<GenerationSettings, Box<dyn std::error::Error>> {
    let default_title = if transition {
        storyboard::TRANSITION_SETTINGS_TITLE
    } else {
        storyboard::SETTINGS_TITLE
    };

    let mut header = GenerationSettings::new(title.unwrap_or_else(|| default_title.to_string()));
    if let (Some(from), Some(to)) = (from_shot, to_shot) {
        header = header
            .entry("Transition From Shot", format!("#{from}"))
            .entry("Transition To Shot", format!("#{to}"));
    }
    for setting in settings {
        let (label, value) = parse_setting(setting)?;
        header = header.entry(label, value);
    }
    Ok(header)
}

#[allow(clippy::too_many_arguments)]
fn run_export(
    global: &GlobalOptions,
    input: PathBuf,
    format: String,
    out: Option<PathBuf>,
    base: String,
    from_shot: Option<u32>,
    to_shot: Option<u32>,
    title: Option<String>,
    settings: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: ExportKind = format.parse()?;
    let shots = storyboard::parse_shot_list(&fs::read_to_string(&input)?)?;

    let transition = matches!(kind, ExportKind::TransitionShots | ExportKind::VideoPrompts);
    let header = export_header(transition, title, from_shot, to_shot, &settings)?;

    let base = match (transition, from_shot, to_shot) {
        (true, Some(from), Some(to)) => storyboard::transition_base_name(from, to),
        _ => base,
    };
    let out = out.unwrap_or_else(|| PathBuf::from(kind.file_name(&base)));
    ensure_writable_path(&out, global.overwrite)?;

    fs::write(&out, kind.render(&header, &shots))?;
    println!(
        "{} {} ({} shot(s))",
        "saved".green().bold(),
        out.display(),
        shots.len()
    );

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "shotframe", &mut std::io::stdout());
        return Ok(());
    }

    apply_global_options(&cli.global)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    match cli.command {
        Commands::Extract {
            input,
            position,
            out,
            json,
        } => runtime.block_on(run_extract(&cli.global, input, position, out, json)),
        Commands::Transition {
            scene1,
            scene2,
            out_dir,
        } => runtime.block_on(run_transition(&cli.global, scene1, scene2, out_dir)),
        Commands::Export {
            input,
            format,
            out,
            base,
            from_shot,
            to_shot,
            title,
            settings,
        } => run_export(
            &cli.global,
            input,
            format,
            out,
            base,
            from_shot,
            to_shot,
            title,
            settings,
        ),
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
