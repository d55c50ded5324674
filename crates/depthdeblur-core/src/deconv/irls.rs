use ndarray::{Array2, Zip};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_IRLS_CG_ITERATIONS, DEFAULT_IRLS_EXPONENT, DEFAULT_IRLS_OUTER_ITERATIONS,
    DEFAULT_IRLS_WEIGHT, IRLS_GRADIENT_FLOOR, IRLS_OUTSIDE_WEIGHT,
};
use crate::fourier::{convolve_otf, correlate_otf, kernel_otf};
use crate::psf::Psf;

/// Parameters of the hyper-Laplacian IRLS deconvolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IrlsParams {
    /// Weight of the gradient prior.
    pub weight: f32,
    /// Prior exponent, `|grad|^exponent`. Values below 1 favor sparse gradients.
    pub exponent: f32,
    /// Number of reweighting steps.
    pub outer_iterations: usize,
    /// Conjugate gradient iterations per reweighting step.
    pub cg_iterations: usize,
}

impl Default for IrlsParams {
    fn default() -> Self {
        Self {
            weight: DEFAULT_IRLS_WEIGHT,
            exponent: DEFAULT_IRLS_EXPONENT,
            outer_iterations: DEFAULT_IRLS_OUTER_ITERATIONS,
            cg_iterations: DEFAULT_IRLS_CG_ITERATIONS,
        }
    }
}

/// Spatial deconvolution with a sparse gradient prior, solved by
/// iteratively reweighted least squares.
///
/// Each reweighting step solves
///
/// ```text
/// (K^T Wd K + weight (Dx^T Wx Dx + Dy^T Wy Dy)) x = K^T Wd b
/// ```
///
/// with conjugate gradients, where `Wx`, `Wy` are `max(|grad|, floor)^(a-2)`
/// from the previous estimate. With a mask, pixels outside it only weakly
/// constrain the data term, so the solution is driven by the region.
pub fn deconvolve_irls(
    blurred: &Array2<f32>,
    psf: &Psf,
    mask: Option<&Array2<bool>>,
    params: &IrlsParams,
) -> Array2<f32> {
    let (h, w) = blurred.dim();
    if h == 0 || w == 0 {
        return blurred.clone();
    }
    let otf = kernel_otf(psf.as_array(), h, w);
    let data_weight = match mask {
        Some(m) if m.dim() == (h, w) => m.mapv(|inside| if inside { 1.0 } else { IRLS_OUTSIDE_WEIGHT }),
        _ => Array2::<f32>::ones((h, w)),
    };

    let weighted_b = &data_weight * blurred;
    let rhs = correlate_otf(&weighted_b, &otf);

    let mut x = blurred.clone();
    for _ in 0..params.outer_iterations.max(1) {
        let (wx, wy) = prior_weights(&x, params.exponent);
        let system = NormalSystem {
            otf: &otf,
            data_weight: &data_weight,
            wx: &wx,
            wy: &wy,
            lambda: params.weight.max(0.0),
        };
        conjugate_gradient(&system, &rhs, &mut x, params.cg_iterations);
    }

    x
}

struct NormalSystem<'a> {
    otf: &'a Array2<Complex<f64>>,
    data_weight: &'a Array2<f32>,
    wx: &'a Array2<f32>,
    wy: &'a Array2<f32>,
    lambda: f32,
}

impl NormalSystem<'_> {
    fn apply(&self, x: &Array2<f32>) -> Array2<f32> {
        let kx = convolve_otf(x, self.otf);
        let data = correlate_otf(&(self.data_weight * &kx), self.otf);

        let gx = diff_x(x);
        let gy = diff_y(x);
        let prior = diff_x_transpose(&(self.wx * &gx)) + diff_y_transpose(&(self.wy * &gy));

        data + prior * self.lambda
    }
}

fn conjugate_gradient(system: &NormalSystem<'_>, rhs: &Array2<f32>, x: &mut Array2<f32>, iterations: usize) {
    let mut r = rhs - &system.apply(x);
    let mut p = r.clone();
    let mut rs_old = dot(&r, &r);

    for _ in 0..iterations {
        if rs_old <= f64::EPSILON {
            break;
        }
        let ap = system.apply(&p);
        let p_ap = dot(&p, &ap);
        if p_ap.abs() <= f64::EPSILON {
            break;
        }
        let alpha = (rs_old / p_ap) as f32;
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &ap);
        let rs_new = dot(&r, &r);
        let beta = (rs_new / rs_old) as f32;
        Zip::from(&mut p).and(&r).for_each(|p, &r| *p = r + beta * *p);
        rs_old = rs_new;
    }
}

fn dot(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0f64, |acc, &x, &y| acc + x as f64 * y as f64)
}

fn prior_weights(x: &Array2<f32>, exponent: f32) -> (Array2<f32>, Array2<f32>) {
    let power = exponent - 2.0;
    let weight = |g: f32| g.abs().max(IRLS_GRADIENT_FLOOR).powf(power);
    (diff_x(x).mapv(weight), diff_y(x).mapv(weight))
}

/// Circular forward difference along columns.
fn diff_x(x: &Array2<f32>) -> Array2<f32> {
    let w = x.ncols();
    Array2::from_shape_fn(x.dim(), |(r, c)| x[[r, (c + 1) % w]] - x[[r, c]])
}

/// Circular forward difference along rows.
fn diff_y(x: &Array2<f32>) -> Array2<f32> {
    let h = x.nrows();
    Array2::from_shape_fn(x.dim(), |(r, c)| x[[(r + 1) % h, c]] - x[[r, c]])
}

fn diff_x_transpose(y: &Array2<f32>) -> Array2<f32> {
    let w = y.ncols();
    Array2::from_shape_fn(y.dim(), |(r, c)| y[[r, (c + w - 1) % w]] - y[[r, c]])
}

fn diff_y_transpose(y: &Array2<f32>) -> Array2<f32> {
    let h = y.nrows();
    Array2::from_shape_fn(y.dim(), |(r, c)| y[[(r + h - 1) % h, c]] - y[[r, c]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_transposes_are_adjoint() {
        let a = Array2::from_shape_fn((7, 9), |(r, c)| ((r * 5 + c * 3) % 11) as f32);
        let b = Array2::from_shape_fn((7, 9), |(r, c)| ((r * 2 + c * 7) % 13) as f32);
        assert!((dot(&diff_x(&a), &b) - dot(&a, &diff_x_transpose(&b))).abs() < 1e-6);
        assert!((dot(&diff_y(&a), &b) - dot(&a, &diff_y_transpose(&b))).abs() < 1e-6);
    }
}
