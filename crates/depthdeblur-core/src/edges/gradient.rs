use ndarray::{Array2, Zip};

use crate::filters::gaussian_blur::reflect_index;

/// Per-axis 3-tap Sobel factors indexed by derivative order.
const SOBEL_TAPS: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [-1.0, 0.0, 1.0], [1.0, -2.0, 1.0]];

/// 3x3 Sobel derivative of order `dx` along columns and `dy` along rows
/// (each 0, 1 or 2). Borders use reflect-101.
pub fn sobel(data: &Array2<f32>, dx: usize, dy: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    let kx = SOBEL_TAPS[dx.min(2)];
    let ky = SOBEL_TAPS[dy.min(2)];
    let mut result = Array2::<f32>::zeros((h, w));
    if h == 0 || w == 0 {
        return result;
    }

    for ((row, col), out) in result.indexed_iter_mut() {
        let mut sum = 0.0f32;
        for (i, &wy) in ky.iter().enumerate() {
            if wy == 0.0 {
                continue;
            }
            let r = reflect_index(row as isize + i as isize - 1, h);
            for (j, &wx) in kx.iter().enumerate() {
                if wx == 0.0 {
                    continue;
                }
                let c = reflect_index(col as isize + j as isize - 1, w);
                sum += wy * wx * data[[r, c]];
            }
        }
        *out = sum;
    }

    result
}

/// First-order Sobel gradients `(gx, gy)`.
pub fn sobel_gradients(data: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    (sobel(data, 1, 0), sobel(data, 0, 1))
}

/// Gradient magnitude `sqrt(gx^2 + gy^2)`.
pub fn gradient_magnitude(gx: &Array2<f32>, gy: &Array2<f32>) -> Array2<f32> {
    let mut mag = Array2::<f32>::zeros(gx.dim());
    Zip::from(&mut mag)
        .and(gx)
        .and(gy)
        .for_each(|m, &x, &y| *m = (x * x + y * y).sqrt());
    mag
}

/// Scale an array in place so that its largest absolute value is 1.
/// Arrays that are identically zero are left untouched.
pub fn normalize_max_abs(data: &mut Array2<f32>) {
    let max = data.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max > 0.0 {
        data.mapv_inplace(|v| v / max);
    }
}

/// Scale both gradient components by one common factor so that the largest
/// absolute component becomes 1.
pub fn normalize_gradient_field(gx: &mut Array2<f32>, gy: &mut Array2<f32>) {
    let max = gx
        .iter()
        .chain(gy.iter())
        .fold(0.0f32, |m, v| m.max(v.abs()));
    if max > 0.0 {
        gx.mapv_inplace(|v| v / max);
        gy.mapv_inplace(|v| v / max);
    }
}

/// Zero every element outside `mask`.
pub fn apply_mask(data: &Array2<f32>, mask: &Array2<bool>) -> Array2<f32> {
    let mut out = data.clone();
    Zip::from(&mut out).and(mask).for_each(|v, &m| {
        if !m {
            *v = 0.0;
        }
    });
    out
}

/// Normalized cross-correlation of `x` and `y` over the pixels in `mask`.
///
/// Returns 0 when the mask is empty or either signal is constant inside it.
pub fn masked_cross_correlation(x: &Array2<f32>, y: &Array2<f32>, mask: &Array2<bool>) -> f32 {
    let mut n = 0usize;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    Zip::from(x).and(y).and(mask).for_each(|&a, &b, &m| {
        if m {
            n += 1;
            sum_x += a as f64;
            sum_y += b as f64;
        }
    });
    if n == 0 {
        return 0.0;
    }
    let mean_x = sum_x / n as f64;
    let mean_y = sum_y / n as f64;

    let mut cov = 0.0f64;
    let mut var_x = 0.0f64;
    let mut var_y = 0.0f64;
    Zip::from(x).and(y).and(mask).for_each(|&a, &b, &m| {
        if m {
            let da = a as f64 - mean_x;
            let db = b as f64 - mean_y;
            cov += da * db;
            var_x += da * da;
            var_y += db * db;
        }
    });

    let denom = (var_x * var_y).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (cov / denom) as f32
}

/// Structural similarity of two images as the masked correlation of their
/// max-normalized Sobel gradient magnitudes.
pub fn gradient_correlation(a: &Array2<f32>, b: &Array2<f32>, mask: &Array2<bool>) -> f32 {
    let magnitude = |img: &Array2<f32>| {
        let (gx, gy) = sobel_gradients(img);
        let mut mag = gradient_magnitude(&gx, &gy);
        normalize_max_abs(&mut mag);
        mag
    };
    masked_cross_correlation(&magnitude(a), &magnitude(b), mask)
}
