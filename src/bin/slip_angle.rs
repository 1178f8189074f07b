use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use slip_angle::FlowSession;
use slip_angle::config::{FailedTrackPolicy, FlowConfig, TimeBase};
use slip_angle::export::save_csv;
use slip_angle::io::{object_from_json, write_run_report};
use slip_angle::sink::{ImageSequenceSink, SinkSettings};
use slip_angle::source::{FrameSource, ImageSequenceSource};
use slip_angle::stats::SampleSummary;
use slip_angle::visualization::RerunSink;

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Png,
    Jpg,
}

impl From<OutputFormat> for ImageFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Parser)]
#[command(version, about, author)]
struct SlipAngleCli {
    /// folder with the input frames, e.g. from `ffmpeg -i drive.mp4 frames/%06d.png`
    input: PathBuf,

    /// folder for the annotated frames
    output: PathBuf,

    /// frame rate of the recording
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// write the angle series as csv
    #[arg(long)]
    stats: Option<PathBuf>,

    /// write run statistics as json
    #[arg(long)]
    summary: Option<PathBuf>,

    /// json config, missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "png")]
    format: OutputFormat,

    /// also log frames and angles to this rerun file (.rrd)
    #[arg(long)]
    rerun: Option<PathBuf>,

    /// count lost features as 0° instead of ignoring them
    #[arg(long)]
    legacy_zero_failed: bool,

    /// stop at the first frame without usable features
    #[arg(long)]
    strict: bool,

    /// stamp samples with frame time instead of wall clock time
    #[arg(long)]
    media_time: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = SlipAngleCli::parse();

    let mut config: FlowConfig = match &cli.config {
        Some(path) => object_from_json(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => FlowConfig::default(),
    };
    if cli.legacy_zero_failed {
        config.estimator.failed_tracks = FailedTrackPolicy::ZeroDisplacement;
    }
    if cli.strict {
        config.session.strict = true;
    }
    if cli.media_time {
        config.session.time_base = TimeBase::Media;
    }

    let source = ImageSequenceSource::open(&cli.input, cli.fps)?;
    let total = source.frame_count().unwrap_or(0) as u64;
    let recording = match &cli.rerun {
        Some(path) => Some(rerun::RecordingStreamBuilder::new("slip_angle").save(path)?),
        None => None,
    };

    let output = cli.output.clone();
    let format = ImageFormat::from(cli.format);
    let mut session = FlowSession::configure(source, config, |info| {
        let frames = ImageSequenceSink::create(SinkSettings::new(output, format, info))?;
        let viewer = recording.map(|r| RerunSink::new(r, "/cam0"));
        Ok((frames, viewer))
    })?;

    let progress = ProgressBar::new(total.saturating_sub(1));
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} frames {per_sec}") {
        progress.set_style(style);
    }
    session = session.with_progress(progress);

    let report = session.run()?;
    println!(
        "processed {} frames in {:.3} sec, {} samples, {} skipped",
        report.frames_processed, report.elapsed_sec, report.samples, report.skipped
    );

    if let Some(path) = &cli.stats {
        save_csv(path, session.samples())
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &cli.summary {
        let summary = SampleSummary::from_samples(session.samples());
        write_run_report(path, &cli.input.to_string_lossy(), &report, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
