use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use depthdeblur_core::deconv::DeconvolutionMethod;
use depthdeblur_core::disparity::DisparityAlgorithm;
use depthdeblur_core::estimate::Granularity;
use depthdeblur_core::io::save_stereo_image;
use depthdeblur_core::pipeline::{run_pipeline, DeblurConfig, PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::config::read_config;
use crate::summary::print_run_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Leaf,
    TopLevel,
}

#[derive(Args)]
pub struct RunArgs {
    /// Left view of the rectified pair
    pub left: Option<PathBuf>,

    /// Right view of the rectified pair
    pub right: Option<PathBuf>,

    /// Deblur config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Kernel width in pixels (even values are reduced by one)
    #[arg(long)]
    pub psf_width: Option<usize>,

    /// Number of depth layers (odd values are reduced by one)
    #[arg(long)]
    pub layers: Option<usize>,

    /// Worker threads
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Upper bound on the number of top-level regions
    #[arg(long)]
    pub max_top_level: Option<usize>,

    /// Directory with the kernel<i>.png bootstrap kernels
    #[arg(long)]
    pub kernels: Option<PathBuf>,

    /// Disparity algorithm (sgbm or match)
    #[arg(long)]
    pub disparity: Option<String>,

    /// Deconvolution used to score candidate kernels (fft or irls)
    #[arg(long)]
    pub selection: Option<String>,

    /// Deconvolution used for the output images (fft or irls)
    #[arg(long = "final")]
    pub final_method: Option<String>,

    /// Regions stitched into the output
    #[arg(long, value_enum)]
    pub granularity: Option<GranularityArg>,

    /// Deconvolve color channels instead of luminance
    #[arg(long)]
    pub color: bool,

    /// Output directory for the deblurred views
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    config.validate()?;
    print_run_summary(&config, &args.output);

    let reporter = Arc::new(BarReporter::new()?);
    let output = run_pipeline(&config, reporter.clone())?;

    reporter.begin_stage(PipelineStage::Writing, Some(2));
    let left_path = output_path(&args.output, &config.left, "left");
    let right_path = output_path(&args.output, &config.right, "right");
    save_stereo_image(&output.left, &left_path)
        .with_context(|| format!("Failed to write {}", left_path.display()))?;
    info!(view = "left", path = %left_path.display(), "Wrote deblurred view");
    reporter.advance(1);
    save_stereo_image(&output.right, &right_path)
        .with_context(|| format!("Failed to write {}", right_path.display()))?;
    info!(view = "right", path = %right_path.display(), "Wrote deblurred view");
    reporter.advance(2);
    reporter.finish();

    println!("\nOutput saved to {} and {}", left_path.display(), right_path.display());
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<DeblurConfig> {
    let mut config = match args.config {
        Some(ref path) => read_config(path)?,
        None => DeblurConfig::default(),
    };

    match (&args.left, &args.right) {
        (Some(left), Some(right)) => {
            config.left = left.clone();
            config.right = right.clone();
        }
        (None, None) if args.config.is_some() => {}
        _ => anyhow::bail!("Both views are required unless a config file names them"),
    }

    if let Some(width) = args.psf_width {
        config.psf_width = width;
    }
    if let Some(layers) = args.layers {
        config.layers = layers;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(max) = args.max_top_level {
        config.max_top_level_nodes = max;
    }
    if let Some(ref dir) = args.kernels {
        config.kernel_dir = dir.clone();
    }
    if let Some(ref name) = args.disparity {
        config.disparity.algorithm = name.parse::<DisparityAlgorithm>()?;
    }
    if let Some(ref name) = args.selection {
        config.deconvolution.selection = name.parse::<DeconvolutionMethod>()?;
    }
    if let Some(ref name) = args.final_method {
        config.deconvolution.final_method = name.parse::<DeconvolutionMethod>()?;
    }
    if let Some(granularity) = args.granularity {
        config.output.granularity = match granularity {
            GranularityArg::Leaf => Granularity::Leaf,
            GranularityArg::TopLevel => Granularity::TopLevel,
        };
    }
    config.output.color |= args.color;
    Ok(config)
}

/// `<dir>/<input stem>_deblurred.<input extension>`
fn output_path(dir: &Path, input: &Path, fallback: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    dir.join(format!("{stem}_deblurred.{ext}"))
}

/// Drives one progress bar, restarted at every stage.
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}
