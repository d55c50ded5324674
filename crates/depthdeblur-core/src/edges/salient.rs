use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SALIENT_BLUR_SIGMA, DEFAULT_SALIENT_RATIO, SALIENT_ORIENTATION_BINS};
use crate::filters::coherence::{coherence_filter, CoherenceParams};
use crate::filters::gaussian_blur::gaussian_blur_array;

use super::gradient::{normalize_gradient_field, sobel_gradients};

/// Parameters of the salient-edge map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SalientEdgeParams {
    /// Gaussian pre-smoothing sigma.
    pub blur_sigma: f32,
    /// Shock filter iterations applied after smoothing.
    pub shock_iterations: usize,
    /// Multiplier `r` of the per-orientation pixel budget `r * sqrt(N * w)`.
    pub ratio: f32,
}

impl Default for SalientEdgeParams {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_SALIENT_BLUR_SIGMA,
            shock_iterations: 2,
            ratio: DEFAULT_SALIENT_RATIO,
        }
    }
}

/// Gradient field pair `(x, y)`.
pub type GradientField = (Array2<f32>, Array2<f32>);

/// Compute the salient-edge gradient map of a (latent) image.
///
/// The image is smoothed and shock filtered, Sobel gradients are taken and
/// only the strongest gradients inside `mask` survive: gradients are binned
/// by orientation into 45 degree groups and each group keeps its
/// `ratio * sqrt(N * psf_width)` largest magnitudes, where `N` is the mask
/// area. Both output fields share one scale factor so that the largest
/// surviving component is +-1; everything outside the mask is zero.
pub fn salient_edge_map(
    image: &Array2<f32>,
    psf_width: usize,
    mask: &Array2<bool>,
    params: &SalientEdgeParams,
) -> GradientField {
    let smoothed = gaussian_blur_array(image, params.blur_sigma);
    let shock = CoherenceParams {
        iterations: params.shock_iterations,
        ..CoherenceParams::default()
    };
    let shocked = coherence_filter(&smoothed, &shock);
    let (mut gx, mut gy) = sobel_gradients(&shocked);

    let area = mask.iter().filter(|&&m| m).count();
    let budget = (params.ratio * ((area * psf_width) as f32).sqrt()).ceil() as usize;

    let mut bins: Vec<Vec<f32>> = vec![Vec::new(); SALIENT_ORIENTATION_BINS];
    Zip::from(&gx).and(&gy).and(mask).for_each(|&x, &y, &m| {
        let mag = (x * x + y * y).sqrt();
        if m && mag > 0.0 {
            bins[orientation_bin(x, y)].push(mag);
        }
    });

    let thresholds: Vec<f32> = bins
        .iter_mut()
        .map(|mags| {
            if mags.is_empty() || budget == 0 {
                return f32::INFINITY;
            }
            mags.sort_by(|a, b| b.total_cmp(a));
            mags[budget.min(mags.len()) - 1]
        })
        .collect();

    Zip::from(&mut gx).and(&mut gy).and(mask).for_each(|x, y, &m| {
        let mag = (*x * *x + *y * *y).sqrt();
        let keep = m && mag > 0.0 && mag >= thresholds[orientation_bin(*x, *y)];
        if !keep {
            *x = 0.0;
            *y = 0.0;
        }
    });

    normalize_gradient_field(&mut gx, &mut gy);
    (gx, gy)
}

/// Orientation group of a gradient, folding opposite directions together.
fn orientation_bin(x: f32, y: f32) -> usize {
    let angle = y.atan2(x).rem_euclid(std::f32::consts::PI);
    let width = std::f32::consts::PI / SALIENT_ORIENTATION_BINS as f32;
    (angle / width) as usize % SALIENT_ORIENTATION_BINS
}
