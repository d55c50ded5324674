use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_LAYERS, DEFAULT_MAX_TOP_LEVEL_NODES, DEFAULT_PSF_WIDTH};
use crate::deconv::DeconvolutionConfig;
use crate::disparity::DisparityConfig;
use crate::edges::SalientEdgeParams;
use crate::error::{DeblurError, Result};
use crate::estimate::{EstimationParams, Granularity};
use crate::filters::CoherenceParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeblurConfig {
    /// Left view of the rectified stereo pair.
    pub left: PathBuf,
    /// Right view of the rectified stereo pair.
    pub right: PathBuf,
    /// Kernel width in pixels; even values are reduced by one.
    #[serde(default = "default_psf_width")]
    pub psf_width: usize,
    /// Number of depth layers; odd values are reduced by one.
    #[serde(default = "default_layers")]
    pub layers: usize,
    /// Worker threads including the calling thread.
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_max_top_level_nodes")]
    pub max_top_level_nodes: usize,
    /// Directory holding the `kernel<i>.png` bootstrap kernels.
    #[serde(default = "default_kernel_dir")]
    pub kernel_dir: PathBuf,
    #[serde(default)]
    pub disparity: DisparityConfig,
    #[serde(default)]
    pub deconvolution: DeconvolutionConfig,
    #[serde(default)]
    pub salient_edges: SalientEdgeParams,
    #[serde(default)]
    pub coherence: CoherenceParams,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub granularity: Granularity,
    /// Deconvolve every color channel instead of the grayscale view.
    pub color: bool,
}

fn default_psf_width() -> usize {
    DEFAULT_PSF_WIDTH
}

fn default_layers() -> usize {
    DEFAULT_LAYERS
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_max_top_level_nodes() -> usize {
    DEFAULT_MAX_TOP_LEVEL_NODES
}

fn default_kernel_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DeblurConfig {
    fn default() -> Self {
        Self {
            left: PathBuf::from("left.png"),
            right: PathBuf::from("right.png"),
            psf_width: default_psf_width(),
            layers: default_layers(),
            threads: default_threads(),
            max_top_level_nodes: default_max_top_level_nodes(),
            kernel_dir: default_kernel_dir(),
            disparity: DisparityConfig::default(),
            deconvolution: DeconvolutionConfig::default(),
            salient_edges: SalientEdgeParams::default(),
            coherence: CoherenceParams::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Kernel widths must be odd; even widths are truncated to the next odd
/// value below.
pub fn normalize_psf_width(width: usize) -> usize {
    if width % 2 == 0 {
        width.saturating_sub(1)
    } else {
        width
    }
}

/// Layer counts must be even; odd counts are truncated.
pub fn normalize_layers(layers: usize) -> usize {
    layers - layers % 2
}

impl DeblurConfig {
    /// Reject settings no run can succeed with. Width and layers are checked
    /// after normalization.
    pub fn validate(&self) -> Result<()> {
        if normalize_psf_width(self.psf_width) == 0 {
            return Err(DeblurError::InvalidConfig(format!(
                "psf_width {} leaves no kernel",
                self.psf_width
            )));
        }
        let layers = normalize_layers(self.layers);
        if layers == 0 || layers > u8::MAX as usize {
            return Err(DeblurError::InvalidConfig(format!(
                "layers must be between 2 and {}, got {}",
                u8::MAX - 1,
                self.layers
            )));
        }
        if self.disparity.block_size % 2 == 0 {
            return Err(DeblurError::InvalidConfig(format!(
                "disparity block_size must be odd, got {}",
                self.disparity.block_size
            )));
        }
        if !(0.0..=1.0).contains(&self.coherence.blend) {
            return Err(DeblurError::InvalidConfig(format!(
                "coherence blend must be in [0, 1], got {}",
                self.coherence.blend
            )));
        }
        Ok(())
    }

    pub fn estimation_params(&self) -> EstimationParams {
        EstimationParams {
            psf_width: normalize_psf_width(self.psf_width),
            deconvolution: self.deconvolution.clone(),
            salient_edges: self.salient_edges.clone(),
            coherence: self.coherence.clone(),
        }
    }
}
