use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Apply Gaussian blur with the given sigma using separable 1D convolution.
///
/// Borders are mirrored without repeating the edge pixel (`dcb|abcd|cba`).
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 {
        return data.clone();
    }
    let kernel = make_gaussian_kernel(sigma, (sigma * 3.0).ceil() as usize);
    let row_pass = convolve_axis(data, &kernel, Axis(1));
    convolve_axis(&row_pass, &kernel, Axis(0))
}

/// Gaussian blur over a `window x window` support, deriving sigma from the
/// window size the way a fixed-aperture smoothing filter does.
pub fn gaussian_blur_window(data: &Array2<f32>, window: usize) -> Array2<f32> {
    let window = window.max(1) | 1;
    let sigma = window_sigma(window);
    let kernel = make_gaussian_kernel(sigma, window / 2);
    let row_pass = convolve_axis(data, &kernel, Axis(1));
    convolve_axis(&row_pass, &kernel, Axis(0))
}

/// Sigma implied by an odd window size: `0.3 * ((n - 1) / 2 - 1) + 0.8`.
pub fn window_sigma(window: usize) -> f32 {
    0.3 * ((window as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn make_gaussian_kernel(sigma: f32, radius: usize) -> Vec<f32> {
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Reflect an out-of-range index back into `0..len` (reflect-101).
pub(crate) fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    let period = 2 * (n - 1);
    let mut m = i.rem_euclid(period);
    if m >= n {
        m = period - m;
    }
    m as usize
}

/// Convolve every lane along `axis` (`Axis(1)` = along rows).
fn convolve_axis(data: &Array2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let len = if axis == Axis(1) { w } else { h };

    let sample = |row: usize, col: usize| -> f32 {
        let mut sum = 0.0f32;
        for (ki, &kv) in kernel.iter().enumerate() {
            let offset = ki as isize - radius as isize;
            let v = if axis == Axis(1) {
                data[[row, reflect_index(col as isize + offset, len)]]
            } else {
                data[[reflect_index(row as isize + offset, len), col]]
            };
            sum += v * kv;
        }
        sum
    };

    let mut result = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                for (col, v) in out.iter_mut().enumerate() {
                    *v = sample(row, col);
                }
            });
    } else {
        for ((row, col), v) in result.indexed_iter_mut() {
            *v = sample(row, col);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_index_mirrors_without_edge_repeat() {
        assert_eq!(reflect_index(-1, 5), 1);
        assert_eq!(reflect_index(-2, 5), 2);
        assert_eq!(reflect_index(5, 5), 3);
        assert_eq!(reflect_index(6, 5), 2);
        assert_eq!(reflect_index(2, 5), 2);
    }
}
