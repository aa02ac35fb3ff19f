use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use garage_crops::config::{PuzzleConfig, load_manifest};
use garage_crops::{GenerateOptions, generate};

/// Pre-generate the six progressive-reveal crop stages for daily garage
/// puzzles and upload them to a bucket or a local directory.
#[derive(Parser, Debug)]
#[command(name = "garage-crops")]
#[command(about = "Generate the zoom-stage crop set for daily garage puzzles")]
#[command(
    long_about = "Generate the six progressive-reveal crop images for a daily garage puzzle.
Crops are computed server-side with exact CSS transform-origin parity, written once
under {puzzleId}/stage_{n}.jpg, and served statically afterwards."
)]
struct Args {
    /// Puzzle identifier (becomes the storage key prefix)
    #[arg(short, long, help = "Puzzle id, e.g. 2026-08-30", conflicts_with = "manifest")]
    puzzle_id: Option<String>,

    /// Source image reference
    #[arg(
        short,
        long,
        help = "Source image: http(s) URL, file path, or data: URI",
        conflicts_with = "manifest"
    )]
    image: Option<String>,

    /// Zoom origin in CSS transform-origin syntax
    #[arg(long, default_value = "center", help = "Zoom origin, e.g. \"30% 70%\" or \"top left\"")]
    origin: String,

    /// Maximum magnification at stage 0
    #[arg(short, long, default_value_t = 5.0, help = "Stage-0 zoom factor (1-10 is typical)")]
    zoom: f64,

    /// Batch manifest: a JSON array of puzzle records
    #[arg(short, long, help = "Generate every puzzle in a JSON manifest file")]
    manifest: Option<String>,

    /// Output destination
    #[arg(
        short,
        long,
        default_value = "./crops",
        help = "Destination: bucket base URL (http/https) or local directory"
    )]
    out: String,

    /// Bearer token for bucket uploads
    #[arg(long, env = "GARAGE_CROPS_TOKEN", help = "Bearer token for HTTP destinations")]
    token: Option<String>,

    /// JPEG quality preset
    #[arg(
        short,
        long,
        default_value = "medium",
        help = "JPEG quality preset: low, medium, high, or a number 1-100"
    )]
    quality: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let jpeg_quality = parse_quality(&args.quality)?;
    let puzzles = collect_puzzles(&args).await?;

    let mut failures = 0usize;
    for puzzle in puzzles {
        let id = puzzle.id.clone();
        let options = GenerateOptions {
            puzzle,
            output: args.out.clone(),
            token: args.token.clone(),
            jpeg_quality,
        };
        match generate(options).await {
            Ok(set) => info!(
                puzzle_id = %set.puzzle_id,
                base_w = set.base.w,
                base_h = set.base.h,
                stages = set.stages.len(),
                "crop set generated"
            ),
            Err(e) => {
                error!(puzzle_id = %id, error = %e, "generation run failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        Err(anyhow!("{failures} generation run(s) failed"))
    } else {
        Ok(())
    }
}

/// Resolve the puzzle list from either the single-puzzle flags or a manifest.
async fn collect_puzzles(args: &Args) -> Result<Vec<PuzzleConfig>> {
    if let Some(manifest) = &args.manifest {
        return Ok(load_manifest(manifest).await?);
    }

    let puzzle_id = args
        .puzzle_id
        .clone()
        .ok_or_else(|| anyhow!("either --manifest or --puzzle-id and --image are required"))?;
    let image = args
        .image
        .clone()
        .ok_or_else(|| anyhow!("--image is required alongside --puzzle-id"))?;

    Ok(vec![PuzzleConfig::new(
        puzzle_id,
        image,
        args.origin.clone(),
        args.zoom,
    )])
}

/// Parse a quality preset name or a bare 1-100 number.
fn parse_quality(quality: &str) -> Result<u8> {
    match quality.to_lowercase().as_str() {
        "low" => Ok(70),
        "medium" => Ok(82),
        "high" => Ok(92),
        other => {
            let q: u8 = other
                .parse()
                .map_err(|_| anyhow!("Invalid quality '{other}': use low, medium, high, or 1-100"))?;
            if (1..=100).contains(&q) {
                Ok(q)
            } else {
                Err(anyhow!("Quality must be between 1 and 100, got {q}"))
            }
        }
    }
}
