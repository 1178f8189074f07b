use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use slip_angle::synthetic::{DriveConfig, drive_sequence};

#[derive(Parser)]
#[command(author, version, about = "Generate a synthetic drive over textured ground", long_about = None)]
struct Args {
    /// Output directory
    output: PathBuf,

    /// Number of frames to generate
    #[arg(short, long, default_value = "60")]
    frames: usize,

    /// Direction of image motion in degrees
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    angle: f32,

    /// Image motion in pixels per frame
    #[arg(short, long, default_value = "4")]
    speed: f32,

    /// Image width
    #[arg(long, default_value = "640")]
    width: u32,

    /// Image height
    #[arg(long, default_value = "480")]
    height: u32,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = DriveConfig {
        width: args.width,
        height: args.height,
        frames: args.frames,
        angle_deg: args.angle,
        speed: args.speed,
        seed: args.seed,
        ..Default::default()
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for (i, frame) in drive_sequence(&config).iter().enumerate() {
        let path = args.output.join(format!("{:06}.png", i));
        frame
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    log::info!("wrote {} frames to {}", config.frames, args.output.display());
    Ok(())
}
