use ndarray::{Array2, Zip};

use crate::consts::OCCLUDED;
use crate::frame::ViewPair;

/// Left/right consistency check: a disparity survives only if the pixel it
/// points to in the other view maps back to it (within one pixel).
/// Everything else is marked [`OCCLUDED`].
pub fn consistency_check(left: &Array2<i32>, right: &Array2<i32>) -> ViewPair<Array2<i32>> {
    let (h, w) = left.dim();

    let checked_left = Array2::from_shape_fn((h, w), |(r, c)| {
        let d = left[[r, c]];
        let target = c as i32 - d;
        if d >= 0 && target >= 0 && (right[[r, target as usize]] - d).abs() <= 1 {
            d
        } else {
            OCCLUDED
        }
    });
    let checked_right = Array2::from_shape_fn((h, w), |(r, c)| {
        let d = right[[r, c]];
        let target = c as i32 + d;
        if d >= 0 && target < w as i32 && (left[[r, target as usize]] - d).abs() <= 1 {
            d
        } else {
            OCCLUDED
        }
    });

    ViewPair::new(checked_left, checked_right)
}

/// Replace occluded pixels by the smaller (farther) of the nearest valid
/// disparities to their left and right on the same row. Rows without any
/// valid disparity become 0.
pub fn fill_occlusions(disparity: &Array2<i32>) -> Array2<i32> {
    let mut filled = disparity.clone();

    for mut row in filled.rows_mut() {
        let original = row.to_vec();
        let w = original.len();
        let mut last_valid = vec![None; w];
        let mut next_valid = vec![None; w];

        let mut seen = None;
        for c in 0..w {
            if original[c] != OCCLUDED {
                seen = Some(original[c]);
            }
            last_valid[c] = seen;
        }
        seen = None;
        for c in (0..w).rev() {
            if original[c] != OCCLUDED {
                seen = Some(original[c]);
            }
            next_valid[c] = seen;
        }

        for (c, v) in row.iter_mut().enumerate() {
            if *v == OCCLUDED {
                *v = match (last_valid[c], next_valid[c]) {
                    (Some(a), Some(b)) => a.min(b),
                    (Some(a), None) | (None, Some(a)) => a,
                    (None, None) => 0,
                };
            }
        }
    }

    filled
}

/// Quantize both disparity maps into `layers` equally wide bins spanning
/// their joint disparity range. Output values lie in `0..layers`.
pub fn quantize(maps: &ViewPair<Array2<i32>>, layers: usize) -> ViewPair<Array2<u8>> {
    let (min, max) = maps
        .left
        .iter()
        .chain(maps.right.iter())
        .fold((i32::MAX, i32::MIN), |(lo, hi), &d| (lo.min(d), hi.max(d)));
    let range = if max >= min { (max - min + 1) as usize } else { 1 };

    let bin = |map: &Array2<i32>| {
        let mut out = Array2::<u8>::zeros(map.dim());
        Zip::from(&mut out).and(map).for_each(|o, &d| {
            let offset = (d - min).max(0) as usize;
            *o = ((offset * layers) / range).min(layers - 1) as u8;
        });
        out
    };

    ViewPair::new(bin(&maps.left), bin(&maps.right))
}
