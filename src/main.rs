use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use doc_capture::capture::{CaptureDevice, StaticCameraDirectory, StillImageCamera, SyntheticCamera};
use doc_capture::config::{CaptureConfig, DocumentLayout, RatioLabel, ResolutionCandidate};
use doc_capture::notify::TracingNotifier;
use doc_capture::DocumentScanner;

const DEVICE_ID: &str = "rear-0";

/// Capture an ID card and derive its document images:
/// full frame, resized canvas, rotated canvas, card number band, holder details.
#[derive(Parser, Debug)]
#[command(name = "doccap")]
#[command(about = "📄 Negotiate a camera mode and derive ID-card images from one frame")]
#[command(long_about = "Negotiate an exact capture resolution for the selected document ratio, grab one frame and
derive the full, resized, rotated, id_region and detail_region JPEGs into the output directory.
Without --input a synthetic camera with the given --mode list stands in for the device.")]
struct Args {
    /// Use an image file as the camera
    #[arg(short, long, help = "Image file to use as the camera (delivered at its native size)")]
    input: Option<PathBuf>,

    /// Native modes of the synthetic camera
    #[arg(short, long = "mode", value_parser = parse_mode, default_values = ["1280x720", "1024x768"],
          help = "Native mode of the synthetic camera, WxH (repeatable)")]
    modes: Vec<ResolutionCandidate>,

    /// Document ratio
    #[arg(short, long, default_value = "16:9", help = "Document ratio: 16:9, 9:16, 4:3 or 3:4")]
    ratio: String,

    /// JPEG quality
    #[arg(short, long, default_value_t = 0.8, help = "JPEG quality in (0, 1]")]
    quality: f32,

    /// Output directory
    #[arg(short, long, default_value = "captures", help = "Directory the JPEGs are written to")]
    out_dir: PathBuf,

    /// Layout file
    #[arg(short, long, help = "JSON document layout (canvas sizes, regions)")]
    layout: Option<PathBuf>,

    /// Print data URLs
    #[arg(long, help = "Also print every artifact as a data URL")]
    data_urls: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Args::parse();

    let layout = match &args.layout {
        Some(path) => DocumentLayout::from_json_file(path)?,
        None => DocumentLayout::default(),
    };
    let config = CaptureConfig {
        ratio: RatioLabel::parse(&args.ratio)?,
        quality: args.quality,
        output_dir: args.out_dir.clone(),
        layout,
        ..CaptureConfig::default()
    };

    let device: Box<dyn CaptureDevice> = match &args.input {
        Some(path) => Box::new(StillImageCamera::from_path(path)?),
        None => Box::new(SyntheticCamera::new(DEVICE_ID, args.modes.clone())),
    };
    let directory = StaticCameraDirectory::single_back(DEVICE_ID);

    let output_dir = config.output_dir.clone();
    let mut scanner = DocumentScanner::new(device, Box::new(directory), Arc::new(TracingNotifier), config)?;
    let size = scanner.open().await?;
    println!("Camera ready: {}x{}", size.w, size.h);

    let set = scanner.capture().await?;

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("creating {}", output_dir.display()))?;
    for (stage, outcome) in set.outcomes() {
        match set.get(*stage) {
            Some(artifact) => {
                let path = output_dir.join(stage.file_name());
                tokio::fs::write(&path, artifact.bytes())
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("  {:<14} {}x{} -> {}", stage.name(), artifact.width, artifact.height, path.display());
                if args.data_urls {
                    println!("{}", artifact.to_data_url());
                }
            }
            None => println!("  {:<14} {}", stage.name(), outcome),
        }
    }

    scanner.dismiss();
    Ok(())
}

/// Parse a mode like "1280x720"
fn parse_mode(mode: &str) -> Result<ResolutionCandidate, String> {
    let (w, h) = mode
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Invalid mode '{}': expected WxH", mode))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("Invalid width in mode: {}", w))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("Invalid height in mode: {}", h))?;
    if width == 0 || height == 0 {
        return Err(format!("Invalid mode '{}': sides must be positive", mode));
    }
    Ok(ResolutionCandidate::new(width, height))
}
