use ndarray::Array2;

use crate::filters::gaussian_blur::gaussian_blur_array;

/// Gaussian smoothing sigma applied before decimation.
const PYRAMID_BLUR_SIGMA: f32 = 1.0;

/// Downsample by an integer ratio: Gaussian smoothing followed by taking
/// every `ratio`-th pixel. Output size is `floor(h / ratio) x floor(w / ratio)`
/// (at least 1x1).
pub fn downsample(data: &Array2<f32>, ratio: usize) -> Array2<f32> {
    let ratio = ratio.max(1);
    if ratio == 1 {
        return data.clone();
    }
    let (h, w) = data.dim();
    let blurred = gaussian_blur_array(data, PYRAMID_BLUR_SIGMA * (ratio as f32 / 2.0));
    let new_h = (h / ratio).max(1);
    let new_w = (w / ratio).max(1);

    Array2::from_shape_fn((new_h, new_w), |(r, c)| {
        blurred[[(r * ratio).min(h - 1), (c * ratio).min(w - 1)]]
    })
}

/// Nearest-neighbour resize of a label map to `h x w`. Labels are copied,
/// never interpolated.
pub fn upsample_nearest(labels: &Array2<u8>, h: usize, w: usize) -> Array2<u8> {
    let (sh, sw) = labels.dim();
    if sh == 0 || sw == 0 {
        return Array2::zeros((h, w));
    }
    Array2::from_shape_fn((h, w), |(r, c)| {
        let sr = ((r * sh) / h).min(sh - 1);
        let sc = ((c * sw) / w).min(sw - 1);
        labels[[sr, sc]]
    })
}
