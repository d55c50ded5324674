use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use depthdeblur_core::disparity::{estimate_disparity, DisparityAlgorithm, DisparityConfig};
use depthdeblur_core::frame::ViewPair;
use depthdeblur_core::io::{load_image, save_image};
use depthdeblur_core::pipeline::config::normalize_layers;
use tracing::info;

#[derive(Args)]
pub struct DisparityArgs {
    /// Left view of the rectified pair
    pub left: PathBuf,

    /// Right view of the rectified pair
    pub right: PathBuf,

    /// Number of depth layers (odd values are reduced by one)
    #[arg(long, default_value = "8")]
    pub layers: usize,

    /// Matching algorithm (sgbm or match)
    #[arg(long, default_value = "sgbm")]
    pub algorithm: String,

    /// Maximum disparity in pixels at full resolution
    #[arg(long)]
    pub max_disparity: Option<usize>,

    /// Output file for the left map; the right map gets a `_right` suffix
    #[arg(short, long, default_value = "disparity.png")]
    pub output: PathBuf,
}

pub fn run(args: &DisparityArgs) -> Result<()> {
    let left = load_image(&args.left)
        .with_context(|| format!("Failed to load {}", args.left.display()))?;
    let right = load_image(&args.right)
        .with_context(|| format!("Failed to load {}", args.right.display()))?;

    let algorithm: DisparityAlgorithm = args.algorithm.parse()?;
    let mut config = DisparityConfig {
        algorithm,
        ..DisparityConfig::default()
    };
    if let Some(max) = args.max_disparity {
        config.max_disparity = max;
    }
    let layers = normalize_layers(args.layers).max(2);

    println!(
        "Matching {}x{} pair with {} ({} layers)",
        left.width(),
        left.height(),
        algorithm,
        layers
    );
    let maps = estimate_disparity(&ViewPair::new(left, right), layers, &config)?;

    let right_path = right_output_path(&args.output);
    save_image(&maps.left.to_frame(), &args.output)?;
    save_image(&maps.right.to_frame(), &right_path)?;
    info!(left = %args.output.display(), right = %right_path.display(), "Wrote disparity maps");
    println!(
        "Disparity maps saved to {} and {}",
        args.output.display(),
        right_path.display()
    );
    Ok(())
}

fn right_output_path(left: &std::path::Path) -> PathBuf {
    let stem = left
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "disparity".into());
    let ext = left
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".into());
    left.with_file_name(format!("{stem}_right.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_map_gets_suffix() {
        let right = right_output_path(std::path::Path::new("maps/depth.tiff"));
        assert_eq!(right, std::path::Path::new("maps/depth_right.tiff"));
    }
}
