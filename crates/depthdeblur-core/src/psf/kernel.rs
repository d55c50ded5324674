use ndarray::Array2;

use crate::error::{DeblurError, Result};

/// Energy-preserving blur kernel: square, odd width, non-negative weights
/// summing to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Psf {
    weights: Array2<f32>,
}

impl Psf {
    /// Build a kernel from raw weights: negative values are clipped to zero
    /// and the remainder is normalized to sum 1.
    pub fn from_weights(mut weights: Array2<f32>) -> Result<Self> {
        let (h, w) = weights.dim();
        if h != w || h % 2 == 0 {
            return Err(DeblurError::DegenerateKernel(format!(
                "kernel must be square with odd width, got {w}x{h}"
            )));
        }
        weights.mapv_inplace(|v| if v.is_finite() { v.max(0.0) } else { 0.0 });
        let sum: f64 = weights.iter().map(|&v| v as f64).sum();
        if sum <= 0.0 {
            return Err(DeblurError::DegenerateKernel(
                "kernel has no positive weight".into(),
            ));
        }
        let inv = (1.0 / sum) as f32;
        weights.mapv_inplace(|v| v * inv);
        Ok(Self { weights })
    }

    /// Single-pixel kernel (no blur).
    pub fn delta(width: usize) -> Self {
        let width = width | 1;
        let mut weights = Array2::<f32>::zeros((width, width));
        weights[[width / 2, width / 2]] = 1.0;
        Self { weights }
    }

    pub fn width(&self) -> usize {
        self.weights.nrows()
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Shannon entropy of the kernel weights, `-sum(p * ln p)` over non-zero
    /// weights. Lower values indicate a more concentrated kernel.
    pub fn entropy(&self) -> f32 {
        kernel_entropy(&self.weights)
    }
}

/// `-sum(p * ln p)` over the positive entries of `weights`.
pub fn kernel_entropy(weights: &Array2<f32>) -> f32 {
    -weights
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.ln())
        .sum::<f32>()
}
