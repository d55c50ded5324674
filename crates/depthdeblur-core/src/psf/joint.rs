use ndarray::{s, Array2, Zip};
use num_complex::Complex;

use crate::consts::JOINT_PSF_GAMMA;
use crate::edges::salient::GradientField;
use crate::error::{DeblurError, Result};
use crate::fourier::{circular_shift, fft2d, ifft2d, impulse_spectrum};
use crate::frame::ViewPair;

use super::kernel::Psf;

/// Estimate one kernel jointly from both views.
///
/// Minimizes `E(k) = sum_i ||S_i * k - B_i||^2 + gamma ||k||^2` where `i`
/// runs over (view, axis), `S_i` are salient-edge gradients and `B_i` the
/// region-masked gradients of the blurred view. The closed-form solution per
/// frequency is
///
/// ```text
/// K = sum_i conj(S_i) B_i / (sum_i conj(S_i) S_i + gamma conj(D) D)
/// ```
///
/// with `D` the spectrum of a unit impulse. `B_i` are gradients of the whole
/// blurred view masked afterwards, so region borders add no edges.
///
/// The spatial result is clipped at zero, shifted so the origin sits at the
/// kernel center, cropped to `psf_width` and normalized.
pub fn estimate_joint_psf(
    blurred: &ViewPair<GradientField>,
    salient: &ViewPair<GradientField>,
    psf_width: usize,
) -> Result<Psf> {
    let (h, w) = blurred.left.0.dim();
    let fields = [
        (&salient.left.0, &blurred.left.0),
        (&salient.left.1, &blurred.left.1),
        (&salient.right.0, &blurred.right.0),
        (&salient.right.1, &blurred.right.1),
    ];
    for (s, b) in &fields {
        if s.dim() != (h, w) || b.dim() != (h, w) {
            return Err(DeblurError::Pipeline(format!(
                "gradient fields differ in size: expected {w}x{h}"
            )));
        }
    }
    if psf_width == 0 || psf_width > h || psf_width > w {
        return Err(DeblurError::InvalidDimensions {
            width: psf_width,
            height: psf_width,
        });
    }

    let mut numerator = Array2::<Complex<f64>>::zeros((h, w));
    let mut denominator = Array2::<f64>::zeros((h, w));
    for (s, b) in &fields {
        let s_hat = fft2d(s);
        let b_hat = fft2d(b);
        Zip::from(&mut numerator)
            .and(&mut denominator)
            .and(&s_hat)
            .and(&b_hat)
            .for_each(|n, d, s, b| {
                *n += s.conj() * b;
                *d += s.norm_sqr();
            });
    }

    let delta = impulse_spectrum(h, w);
    Zip::from(&mut numerator)
        .and(&denominator)
        .and(&delta)
        .for_each(|n, &d, dl| *n /= d + JOINT_PSF_GAMMA * dl.norm_sqr());

    let mut spatial = ifft2d(&numerator);
    spatial.mapv_inplace(|v| v.max(0.0));

    let half = (psf_width - 1) / 2;
    let centered = circular_shift(&spatial, half, half);
    let cropped = centered
        .slice(s![..psf_width, ..psf_width])
        .mapv(|v| v as f32);

    Psf::from_weights(cropped)
}
