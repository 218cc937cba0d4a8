use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lifereel::{
    Emotion, JobCoordinator, JobStatus, MusicOracle, ReelConfig, ReelImage, ReelRequest,
    TimelineEntry, ToneOracle, build_timeline, shared_tone_oracle,
};

#[derive(Parser, Debug)]
#[command(name = "lifereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the emotion timeline for a list of emotions as JSON.
    Timeline(TimelineArgs),
    /// Render a reel MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Comma-separated `emotion[:intensity]` list, e.g. `happy:0.9,sad,happy`.
    #[arg(long)]
    emotions: String,

    /// Seconds per image.
    #[arg(long, default_value_t = 3.0)]
    duration: f64,

    /// Seconds of transition between images.
    #[arg(long, default_value_t = 1.0)]
    transition: f64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Image as `path[:emotion[:intensity]]`; repeat in display order.
    #[arg(long = "image", required = true)]
    images: Vec<String>,

    /// Output directory (overrides the config).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up waiting after this many seconds.
    #[arg(long, default_value_t = 3600)]
    timeout_secs: u64,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lifereel=info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Timeline(args) => cmd_timeline(args),
        Command::Render(args) => cmd_render(args).await,
    }
}

fn parse_entry(arg: &str) -> anyhow::Result<TimelineEntry> {
    let (label, intensity) = match arg.split_once(':') {
        Some((label, intensity)) => (label, Some(parse_intensity(intensity)?)),
        None => (arg, None),
    };
    Ok(TimelineEntry {
        emotion: label.parse::<Emotion>()?,
        intensity,
    })
}

fn parse_intensity(s: &str) -> anyhow::Result<f32> {
    s.trim()
        .parse::<f32>()
        .with_context(|| format!("invalid intensity '{s}'"))
}

// `path[:emotion[:intensity]]`, split from the right so paths may contain ':'.
fn parse_image(arg: &str) -> anyhow::Result<ReelImage> {
    let parts: Vec<&str> = arg.rsplitn(3, ':').collect();
    let image = match parts.as_slice() {
        [intensity, emotion, path]
            if emotion.parse::<Emotion>().is_ok() && intensity.parse::<f32>().is_ok() =>
        {
            ReelImage::new(*path).with_emotion(emotion.parse()?, Some(parse_intensity(intensity)?))
        }
        [emotion, rest @ ..] if emotion.parse::<Emotion>().is_ok() && !rest.is_empty() => {
            let path = arg
                .rsplit_once(':')
                .map(|(p, _)| p)
                .unwrap_or(arg);
            ReelImage::new(path).with_emotion(emotion.parse()?, None)
        }
        _ => ReelImage::new(arg),
    };
    Ok(image)
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let entries = args
        .emotions
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_entry)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let timeline = build_timeline(&entries, args.duration, args.transition)?;
    println!("{}", serde_json::to_string_pretty(&timeline)?);
    Ok(())
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match args.config.as_deref() {
        Some(path) => ReelConfig::from_json_file(path)?,
        None => ReelConfig::default(),
    }
    .apply_env()?;
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }

    let images = args
        .images
        .iter()
        .map(|s| parse_image(s))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let request = ReelRequest {
        images,
        duration_per_image: config.duration_per_image,
        transition_duration: config.transition_duration,
    };

    let music: Arc<dyn MusicOracle> = if config.sample_rate == lifereel::SAMPLE_RATE {
        shared_tone_oracle()
    } else {
        Arc::new(ToneOracle::new(config.sample_rate))
    };
    let coordinator = JobCoordinator::builder(config, music).start()?;

    let accepted = coordinator.submit(request)?;
    eprintln!("job {} {}", accepted.job_id, accepted.status);
    let status = coordinator
        .wait_for_terminal(accepted.job_id, Duration::from_secs(args.timeout_secs))
        .await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    if status.status == JobStatus::Failed {
        anyhow::bail!(
            "job {} failed{}",
            status.job_id,
            status
                .error
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/bin/lifereel.rs"]
mod tests;
