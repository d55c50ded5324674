//! Stereo disparity estimation and depth-layer quantization.
//!
//! Views are matched at half resolution (blur is roughly halved as well),
//! unmatched pixels are filled from their background neighbours, the result
//! is quantized into `layers` depth layers and finally brought back to full
//! resolution without interpolating label values.

mod matching;
mod postprocess;
mod pyramid;

use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MAX_DISPARITY, DEFAULT_SGM_P1, DEFAULT_SGM_P2,
    DISPARITY_SAMPLE_RATIO,
};
use crate::error::{DeblurError, Result};
use crate::frame::{Frame, View, ViewPair};

pub use matching::{block_match, cost_volume, semi_global_match, CostVolume};
pub use postprocess::{consistency_check, fill_occlusions, quantize};
pub use pyramid::{downsample, upsample_nearest};

/// Matching strategy used to compute raw disparities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisparityAlgorithm {
    /// Winner-takes-all over window SAD costs.
    BlockMatch,
    /// SAD costs aggregated along four scanline directions.
    #[default]
    SemiGlobal,
}

impl std::fmt::Display for DisparityAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockMatch => write!(f, "Block Match"),
            Self::SemiGlobal => write!(f, "Semi-Global"),
        }
    }
}

impl FromStr for DisparityAlgorithm {
    type Err = DeblurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "match" | "block-match" | "blockmatch" => Ok(Self::BlockMatch),
            "sgbm" | "sgm" | "semi-global" | "semiglobal" => Ok(Self::SemiGlobal),
            _ => Err(DeblurError::InvalidDisparityAlgorithm(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisparityConfig {
    pub algorithm: DisparityAlgorithm,
    /// Maximum disparity at full resolution, in pixels.
    pub max_disparity: usize,
    /// Matching window side length (odd).
    pub block_size: usize,
    /// Semi-global penalty for a disparity change of one.
    pub p1: f32,
    /// Semi-global penalty for larger disparity jumps.
    pub p2: f32,
}

impl Default for DisparityConfig {
    fn default() -> Self {
        Self {
            algorithm: DisparityAlgorithm::default(),
            max_disparity: DEFAULT_MAX_DISPARITY,
            block_size: DEFAULT_BLOCK_SIZE,
            p1: DEFAULT_SGM_P1,
            p2: DEFAULT_SGM_P2,
        }
    }
}

/// Quantized per-pixel depth layer of one view, values in `0..layers`.
#[derive(Clone, Debug)]
pub struct DisparityMap {
    pub data: Array2<u8>,
    pub layers: usize,
}

impl DisparityMap {
    pub fn new(data: Array2<u8>, layers: usize) -> Self {
        Self { data, layers }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Pixels whose layer lies in `layers`.
    pub fn mask(&self, layers: std::ops::Range<u8>) -> Array2<bool> {
        self.data.mapv(|d| layers.contains(&d))
    }

    /// Layer map scaled to [0, 1] for inspection.
    pub fn to_frame(&self) -> Frame {
        let scale = if self.layers > 1 {
            1.0 / (self.layers - 1) as f32
        } else {
            0.0
        };
        Frame::new(self.data.mapv(|d| d as f32 * scale), 8)
    }
}

/// Estimate quantized disparity maps for both views.
pub fn estimate_disparity(
    gray: &ViewPair<Frame>,
    layers: usize,
    config: &DisparityConfig,
) -> Result<ViewPair<DisparityMap>> {
    let (h, w) = gray.left.data.dim();
    if gray.right.data.dim() != (h, w) {
        return Err(DeblurError::ViewMismatch(format!(
            "{}x{} vs {}x{}",
            w,
            h,
            gray.right.width(),
            gray.right.height()
        )));
    }
    if layers == 0 || layers > u8::MAX as usize + 1 {
        return Err(DeblurError::InvalidConfig(format!(
            "layer count {layers} out of range"
        )));
    }

    let small = gray.map(|f| downsample(&f.data, DISPARITY_SAMPLE_RATIO));
    let max_disparity = (config.max_disparity / DISPARITY_SAMPLE_RATIO).max(1);
    info!(
        algorithm = %config.algorithm,
        max_disparity,
        width = small.left.ncols(),
        height = small.left.nrows(),
        "Estimating disparity"
    );

    let raw = ViewPair::new(
        match_view(&small, View::Left, max_disparity, config),
        match_view(&small, View::Right, max_disparity, config),
    );

    let checked = consistency_check(&raw.left, &raw.right);
    let filled = ViewPair::new(fill_occlusions(&checked.left), fill_occlusions(&checked.right));
    let quantized = quantize(&filled, layers);
    debug!(layers, "Disparity quantized");

    Ok(ViewPair::new(
        DisparityMap::new(upsample_nearest(&quantized.left, h, w), layers),
        DisparityMap::new(upsample_nearest(&quantized.right, h, w), layers),
    ))
}

fn match_view(
    small: &ViewPair<Array2<f32>>,
    reference: View,
    max_disparity: usize,
    config: &DisparityConfig,
) -> Array2<i32> {
    let volume = cost_volume(small, reference, max_disparity, config.block_size);
    match config.algorithm {
        DisparityAlgorithm::BlockMatch => block_match(&volume),
        DisparityAlgorithm::SemiGlobal => semi_global_match(&volume, config.p1, config.p2),
    }
}
