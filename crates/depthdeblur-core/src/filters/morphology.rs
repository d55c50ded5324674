use ndarray::Array2;

/// Grayscale erosion: each pixel becomes the minimum of its 3x3 neighborhood.
/// Out-of-bounds neighbors are ignored.
pub fn erode(data: &Array2<f32>) -> Array2<f32> {
    neighborhood_extreme(data, f32::min, f32::INFINITY)
}

/// Grayscale dilation: each pixel becomes the maximum of its 3x3 neighborhood.
/// Out-of-bounds neighbors are ignored.
pub fn dilate(data: &Array2<f32>) -> Array2<f32> {
    neighborhood_extreme(data, f32::max, f32::NEG_INFINITY)
}

fn neighborhood_extreme(data: &Array2<f32>, pick: fn(f32, f32) -> f32, init: f32) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        let r0 = row.saturating_sub(1);
        let r1 = (row + 1).min(h - 1);
        for col in 0..w {
            let c0 = col.saturating_sub(1);
            let c1 = (col + 1).min(w - 1);
            let mut acc = init;
            for nr in r0..=r1 {
                for nc in c0..=c1 {
                    acc = pick(acc, data[[nr, nc]]);
                }
            }
            result[[row, col]] = acc;
        }
    }

    result
}
