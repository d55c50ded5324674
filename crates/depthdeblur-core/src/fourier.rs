use std::sync::Arc;

use ndarray::{Array2, Axis, Zip};
use num_complex::Complex;
use num_traits::Zero;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

// ---------------------------------------------------------------------------
// 2-D transforms
// ---------------------------------------------------------------------------

/// Forward 2-D DFT of a real array.
pub fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let mut work = data.mapv(|v| Complex::new(v as f64, 0.0));
    transform_in_place(&mut work, false);
    work
}

/// Inverse 2-D DFT, returning the (scaled) real part.
pub fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut work = data.clone();
    transform_in_place(&mut work, true);
    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}

fn transform_in_place(work: &mut Array2<Complex<f64>>, inverse: bool) {
    let (h, w) = work.dim();
    if h == 0 || w == 0 {
        return;
    }
    let mut planner = FftPlanner::new();
    let (row_fft, col_fft) = if inverse {
        (planner.plan_fft_inverse(w), planner.plan_fft_inverse(h))
    } else {
        (planner.plan_fft_forward(w), planner.plan_fft_forward(h))
    };
    let parallel = h * w >= PARALLEL_PIXEL_THRESHOLD;

    process_lanes(work, Axis(0), &row_fft, parallel);
    process_lanes(work, Axis(1), &col_fft, parallel);
}

/// Run `fft` over every 1-D lane along `axis` (rows for `Axis(0)`).
fn process_lanes(
    work: &mut Array2<Complex<f64>>,
    axis: Axis,
    fft: &Arc<dyn Fft<f64>>,
    parallel: bool,
) {
    let run = |mut lane: ndarray::ArrayViewMut1<Complex<f64>>| {
        let mut buf = lane.to_vec();
        fft.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf) {
            *dst = src;
        }
    };

    if parallel {
        work.axis_iter_mut(axis).into_par_iter().for_each(run);
    } else {
        work.axis_iter_mut(axis).for_each(run);
    }
}

// ---------------------------------------------------------------------------
// Kernel helpers
// ---------------------------------------------------------------------------

/// Embed a small centered kernel into an `h x w` array with its center at
/// (0,0) and wrap-around (FFT-ready layout).
pub fn embed_kernel(kernel: &Array2<f32>, h: usize, w: usize) -> Array2<f32> {
    let (kh, kw) = kernel.dim();
    let cy = kh / 2;
    let cx = kw / 2;
    let mut padded = Array2::<f32>::zeros((h, w));

    for ((r, c), &v) in kernel.indexed_iter() {
        let row = (r as isize - cy as isize).rem_euclid(h as isize) as usize;
        let col = (c as isize - cx as isize).rem_euclid(w as isize) as usize;
        padded[[row, col]] += v;
    }

    padded
}

/// Optical transfer function of a centered kernel for an `h x w` image.
pub fn kernel_otf(kernel: &Array2<f32>, h: usize, w: usize) -> Array2<Complex<f64>> {
    fft2d(&embed_kernel(kernel, h, w))
}

/// Spectrum of a unit impulse at the origin.
pub fn impulse_spectrum(h: usize, w: usize) -> Array2<Complex<f64>> {
    let mut delta = Array2::<f32>::zeros((h, w));
    if h > 0 && w > 0 {
        delta[[0, 0]] = 1.0;
    }
    fft2d(&delta)
}

/// Squared magnitude of the forward-difference gradient filters
/// `|Gx|^2 + |Gy|^2`, used as a smoothness prior in the frequency domain.
pub fn gradient_prior_spectrum(h: usize, w: usize) -> Array2<f64> {
    let mut dx = Array2::<f32>::zeros((h, w));
    let mut dy = Array2::<f32>::zeros((h, w));
    if h > 1 && w > 1 {
        dx[[0, 0]] = -1.0;
        dx[[0, 1]] = 1.0;
        dy[[0, 0]] = -1.0;
        dy[[1, 0]] = 1.0;
    }
    let gx = fft2d(&dx);
    let gy = fft2d(&dy);
    let mut prior = Array2::<f64>::zeros((h, w));
    Zip::from(&mut prior)
        .and(&gx)
        .and(&gy)
        .for_each(|p, x, y| *p = x.norm_sqr() + y.norm_sqr());
    prior
}

/// Circular convolution of `data` with a precomputed OTF.
pub fn convolve_otf(data: &Array2<f32>, otf: &Array2<Complex<f64>>) -> Array2<f32> {
    let mut spectrum = fft2d(data);
    Zip::from(&mut spectrum).and(otf).for_each(|s, k| *s *= k);
    ifft2d(&spectrum).mapv(|v| v as f32)
}

/// Circular correlation (convolution with the flipped kernel).
pub fn correlate_otf(data: &Array2<f32>, otf: &Array2<Complex<f64>>) -> Array2<f32> {
    let mut spectrum = fft2d(data);
    Zip::from(&mut spectrum)
        .and(otf)
        .for_each(|s, k| *s *= k.conj());
    ifft2d(&spectrum).mapv(|v| v as f32)
}

/// Circularly shift an array so that element (0,0) moves to (dy, dx).
pub fn circular_shift<T: Clone + Zero>(data: &Array2<T>, dy: usize, dx: usize) -> Array2<T> {
    let (h, w) = data.dim();
    let mut shifted = Array2::<T>::zeros((h, w));
    for ((r, c), v) in data.indexed_iter() {
        shifted[[(r + dy) % h, (c + dx) % w]] = v.clone();
    }
    shifted
}
