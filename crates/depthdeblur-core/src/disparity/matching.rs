use ndarray::Array2;
use rayon::prelude::*;

use crate::frame::{View, ViewPair};

/// Matching cost assigned where the candidate pixel falls outside the
/// other view.
const OUT_OF_VIEW_COST: f32 = 255.0;

/// Per-pixel matching costs for every disparity `0..=max_disparity`.
#[derive(Clone, Debug)]
pub struct CostVolume {
    pub height: usize,
    pub width: usize,
    pub disparities: usize,
    /// Row-major `(row, col, disparity)` layout.
    pub costs: Vec<f32>,
}

impl CostVolume {
    #[inline]
    pub fn at(&self, row: usize, col: usize, d: usize) -> f32 {
        self.costs[(row * self.width + col) * self.disparities + d]
    }

    fn pixel(&self, row: usize, col: usize) -> &[f32] {
        let start = (row * self.width + col) * self.disparities;
        &self.costs[start..start + self.disparities]
    }
}

/// Build the window-averaged absolute-difference cost volume, in 8-bit
/// intensity units, for `reference` against the other view.
///
/// For the left view a pixel `(r, c)` is matched against `(r, c - d)` in the
/// right view; for the right view against `(r, c + d)` in the left view.
pub fn cost_volume(
    views: &ViewPair<Array2<f32>>,
    reference: View,
    max_disparity: usize,
    block_size: usize,
) -> CostVolume {
    let (h, w) = views.left.dim();
    let disparities = max_disparity + 1;
    let (base, other) = match reference {
        View::Left => (&views.left, &views.right),
        View::Right => (&views.right, &views.left),
    };
    let radius = block_size.max(1) / 2;

    let slices: Vec<Array2<f32>> = (0..disparities)
        .into_par_iter()
        .map(|d| {
            let diff = Array2::from_shape_fn((h, w), |(r, c)| {
                let src = match reference {
                    View::Left => c.checked_sub(d),
                    View::Right => Some(c + d).filter(|&x| x < w),
                };
                match src {
                    Some(sc) => (base[[r, c]] - other[[r, sc]]).abs() * 255.0,
                    None => OUT_OF_VIEW_COST,
                }
            });
            box_mean(&diff, radius)
        })
        .collect();

    let mut costs = vec![0.0f32; h * w * disparities];
    for (d, slice) in slices.iter().enumerate() {
        for ((r, c), &v) in slice.indexed_iter() {
            costs[(r * w + c) * disparities + d] = v;
        }
    }

    CostVolume {
        height: h,
        width: w,
        disparities,
        costs,
    }
}

/// Mean over a `(2 * radius + 1)^2` window clipped to the image.
fn box_mean(data: &Array2<f32>, radius: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut integral = Array2::<f64>::zeros((h + 1, w + 1));
    for r in 0..h {
        let mut row_sum = 0.0f64;
        for c in 0..w {
            row_sum += data[[r, c]] as f64;
            integral[[r + 1, c + 1]] = integral[[r, c + 1]] + row_sum;
        }
    }

    Array2::from_shape_fn((h, w), |(r, c)| {
        let r0 = r.saturating_sub(radius);
        let c0 = c.saturating_sub(radius);
        let r1 = (r + radius + 1).min(h);
        let c1 = (c + radius + 1).min(w);
        let sum = integral[[r1, c1]] - integral[[r0, c1]] - integral[[r1, c0]] + integral[[r0, c0]];
        (sum / ((r1 - r0) * (c1 - c0)) as f64) as f32
    })
}

/// Winner-takes-all disparity over raw window costs.
pub fn block_match(volume: &CostVolume) -> Array2<i32> {
    Array2::from_shape_fn((volume.height, volume.width), |(r, c)| {
        argmin(volume.pixel(r, c)) as i32
    })
}

/// Semi-global matching: costs are aggregated along the four axis-aligned
/// scanline directions with penalties `p1` (disparity change of one) and
/// `p2` (larger jumps), then the minimum aggregated cost wins.
pub fn semi_global_match(volume: &CostVolume, p1: f32, p2: f32) -> Array2<i32> {
    let (h, w, nd) = (volume.height, volume.width, volume.disparities);
    let mut total = vec![0.0f32; h * w * nd];

    // (row step, col step) of each path direction.
    let directions: [(isize, isize); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
    for &(dr, dc) in &directions {
        let aggregated = aggregate_path(volume, dr, dc, p1, p2);
        for (t, a) in total.iter_mut().zip(aggregated) {
            *t += a;
        }
    }

    Array2::from_shape_fn((h, w), |(r, c)| {
        let start = (r * w + c) * nd;
        argmin(&total[start..start + nd]) as i32
    })
}

fn aggregate_path(volume: &CostVolume, dr: isize, dc: isize, p1: f32, p2: f32) -> Vec<f32> {
    let (h, w, nd) = (volume.height, volume.width, volume.disparities);
    let mut agg = vec![0.0f32; h * w * nd];
    let mut prev = vec![0.0f32; nd];

    let rows: Vec<usize> = if dr >= 0 { (0..h).collect() } else { (0..h).rev().collect() };
    let cols: Vec<usize> = if dc >= 0 { (0..w).collect() } else { (0..w).rev().collect() };

    for &r in &rows {
        for &c in &cols {
            let pr = r as isize - dr;
            let pc = c as isize - dc;
            let idx = (r * w + c) * nd;
            let raw = volume.pixel(r, c);

            if pr < 0 || pc < 0 || pr >= h as isize || pc >= w as isize {
                agg[idx..idx + nd].copy_from_slice(raw);
                continue;
            }

            let pidx = (pr as usize * w + pc as usize) * nd;
            prev.copy_from_slice(&agg[pidx..pidx + nd]);
            let prev_min = prev.iter().copied().fold(f32::INFINITY, f32::min);

            let cur = &mut agg[idx..idx + nd];
            for d in 0..nd {
                let mut best = prev[d].min(prev_min + p2);
                if d > 0 {
                    best = best.min(prev[d - 1] + p1);
                }
                if d + 1 < nd {
                    best = best.min(prev[d + 1] + p1);
                }
                cur[d] = raw[d] + best - prev_min;
            }
        }
    }

    agg
}

fn argmin(costs: &[f32]) -> usize {
    costs
        .iter()
        .enumerate()
        .fold((0, f32::INFINITY), |(bi, bv), (i, &v)| if v < bv { (i, v) } else { (bi, bv) })
        .0
}
