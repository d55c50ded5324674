//! Non-blind deconvolution used to produce latent images.

pub mod fft;
pub mod irls;

use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FFT_WEIGHT;
use crate::error::{DeblurError, Result};
use crate::psf::Psf;

pub use fft::deconvolve_fft;
pub use irls::{deconvolve_irls, IrlsParams};

/// Non-blind deconvolution solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeconvolutionMethod {
    /// Closed-form frequency-domain solve with a quadratic gradient prior.
    #[default]
    Fft,
    /// Iteratively reweighted least squares with a hyper-Laplacian prior.
    Irls,
}

impl std::fmt::Display for DeconvolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fft => write!(f, "FFT"),
            Self::Irls => write!(f, "IRLS"),
        }
    }
}

impl FromStr for DeconvolutionMethod {
    type Err = DeblurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fft" | "wiener" => Ok(Self::Fft),
            "irls" | "sparse" => Ok(Self::Irls),
            _ => Err(DeblurError::InvalidDeconvolutionMethod(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconvolutionConfig {
    /// Solver used while scoring candidate kernels and estimating children.
    pub selection: DeconvolutionMethod,
    /// Solver used for the final composited output.
    pub final_method: DeconvolutionMethod,
    /// Gradient-prior weight of the FFT solver.
    pub fft_weight: f32,
    pub irls: IrlsParams,
}

impl Default for DeconvolutionConfig {
    fn default() -> Self {
        Self {
            selection: DeconvolutionMethod::Fft,
            final_method: DeconvolutionMethod::Irls,
            fft_weight: DEFAULT_FFT_WEIGHT,
            irls: IrlsParams::default(),
        }
    }
}

/// Deconvolve `blurred` with `psf` using `method`.
///
/// The mask only matters for IRLS, where it restricts the data term to the
/// region; the FFT solver always works on the whole plane.
pub fn deconvolve(
    blurred: &Array2<f32>,
    psf: &Psf,
    mask: Option<&Array2<bool>>,
    method: DeconvolutionMethod,
    config: &DeconvolutionConfig,
) -> Array2<f32> {
    match method {
        DeconvolutionMethod::Fft => deconvolve_fft(blurred, psf, config.fft_weight),
        DeconvolutionMethod::Irls => deconvolve_irls(blurred, psf, mask, &config.irls),
    }
}
