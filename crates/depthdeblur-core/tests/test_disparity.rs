use depthdeblur_core::consts::OCCLUDED;
use depthdeblur_core::disparity::{
    block_match, consistency_check, cost_volume, downsample, estimate_disparity, fill_occlusions,
    quantize, semi_global_match, upsample_nearest, DisparityAlgorithm, DisparityConfig,
};
use depthdeblur_core::frame::{Frame, View, ViewPair};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BACKGROUND_SHIFT: usize = 4;
const FOREGROUND_SHIFT: usize = 16;

fn texture(h: usize, w: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((h, w), |_| rng.random_range(0.1f32..0.9))
}

fn in_foreground(r: usize, c: usize) -> bool {
    (16..48).contains(&r) && (56..88).contains(&c)
}

/// Textured background at a small disparity with a textured block in front
/// of it at a large disparity.
fn two_plane_pair() -> ViewPair<Frame> {
    let (h, w) = (64, 128);
    let background = texture(h, w + BACKGROUND_SHIFT, 1);
    let foreground = texture(h, w + FOREGROUND_SHIFT, 2);

    let left = Array2::from_shape_fn((h, w), |(r, c)| {
        if in_foreground(r, c) {
            foreground[[r, c]]
        } else {
            background[[r, c]]
        }
    });
    let right = Array2::from_shape_fn((h, w), |(r, c)| {
        if in_foreground(r, c + FOREGROUND_SHIFT) {
            foreground[[r, c + FOREGROUND_SHIFT]]
        } else {
            background[[r, c + BACKGROUND_SHIFT]]
        }
    });
    ViewPair::new(Frame::new(left, 8), Frame::new(right, 8))
}

fn config(algorithm: DisparityAlgorithm) -> DisparityConfig {
    DisparityConfig {
        algorithm,
        max_disparity: 24,
        ..DisparityConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

#[test]
fn test_semi_global_separates_two_planes() {
    let maps = estimate_disparity(&two_plane_pair(), 2, &config(DisparityAlgorithm::SemiGlobal)).unwrap();

    assert_eq!(maps.left.dim(), (64, 128));
    assert_eq!(maps.left.data[[32, 72]], 1);
    assert_eq!(maps.left.data[[32, 20]], 0);
    assert_eq!(maps.right.data[[32, 72 - FOREGROUND_SHIFT]], 1);
    assert_eq!(maps.right.data[[32, 110]], 0);
}

#[test]
fn test_block_match_separates_two_planes() {
    let maps = estimate_disparity(&two_plane_pair(), 2, &config(DisparityAlgorithm::BlockMatch)).unwrap();
    assert_eq!(maps.left.data[[32, 72]], 1);
    assert_eq!(maps.left.data[[32, 20]], 0);
}

#[test]
fn test_layers_stay_in_range() {
    let maps = estimate_disparity(&two_plane_pair(), 6, &config(DisparityAlgorithm::SemiGlobal)).unwrap();
    for map in [&maps.left, &maps.right] {
        assert_eq!(map.layers, 6);
        assert!(map.data.iter().all(|&d| d < 6));
    }
}

#[test]
fn test_mismatched_views_are_rejected() {
    let pair = ViewPair::new(
        Frame::new(Array2::zeros((16, 16)), 8),
        Frame::new(Array2::zeros((16, 12)), 8),
    );
    assert!(estimate_disparity(&pair, 2, &DisparityConfig::default()).is_err());
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Left and right views of one texture shifted by `shift` columns.
fn shifted_pair(shift: usize) -> ViewPair<Array2<f32>> {
    let (h, w) = (24, 48);
    let wide = Array2::from_shape_fn((h, w + shift), |(r, c)| {
        0.2 + 0.6 * ((r * 31 + c * 17) % 23) as f32 / 22.0
    });
    let left = Array2::from_shape_fn((h, w), |(r, c)| wide[[r, c]]);
    let right = Array2::from_shape_fn((h, w), |(r, c)| wide[[r, c + shift]]);
    ViewPair::new(left, right)
}

#[test]
fn test_block_match_recovers_constant_shift() {
    let volume = cost_volume(&shifted_pair(3), View::Left, 6, 5);
    assert_eq!(block_match(&volume)[[12, 30]], 3);
}

#[test]
fn test_semi_global_recovers_constant_shift_for_both_views() {
    let pair = shifted_pair(2);
    let left = semi_global_match(&cost_volume(&pair, View::Left, 5, 5), 8.0, 32.0);
    let right = semi_global_match(&cost_volume(&pair, View::Right, 5, 5), 8.0, 32.0);
    assert_eq!(left[[12, 24]], 2);
    assert_eq!(right[[12, 24]], 2);
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

#[test]
fn test_inconsistent_match_is_occluded() {
    let left = Array2::from_shape_vec((1, 4), vec![0, 0, 1, 3]).unwrap();
    let right = Array2::from_shape_vec((1, 4), vec![0, 1, 0, 0]).unwrap();
    let checked = consistency_check(&left, &right);
    // Column 3 lands on right column 0, which reports 0 instead of 3.
    assert_eq!(checked.left[[0, 3]], OCCLUDED);
    assert_eq!(checked.left[[0, 2]], 1);
}

#[test]
fn test_occlusions_take_background_disparity() {
    let d = Array2::from_shape_vec((1, 5), vec![4, OCCLUDED, OCCLUDED, 2, 3]).unwrap();
    assert_eq!(fill_occlusions(&d).row(0).to_vec(), vec![4, 2, 2, 2, 3]);
}

#[test]
fn test_quantization_spans_all_layers() {
    let left = Array2::from_shape_vec((1, 4), vec![0, 3, 5, 7]).unwrap();
    let right = Array2::from_shape_vec((1, 4), vec![0, 1, 2, 7]).unwrap();
    let q = quantize(&ViewPair::new(left, right), 4);
    assert_eq!(q.left.row(0).to_vec(), vec![0, 1, 2, 3]);
    assert_eq!(q.right.row(0).to_vec(), vec![0, 0, 1, 3]);
}

// ---------------------------------------------------------------------------
// Pyramid
// ---------------------------------------------------------------------------

#[test]
fn test_downsample_halves_dimensions() {
    assert_eq!(downsample(&Array2::<f32>::zeros((9, 12)), 2).dim(), (4, 6));
}

#[test]
fn test_upsample_keeps_label_set() {
    let labels = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as u8);
    let up = upsample_nearest(&labels, 7, 7);
    assert_eq!(up.dim(), (7, 7));
    assert!(up.iter().all(|&v| v < 9));
    assert_eq!(up[[0, 0]], 0);
    assert_eq!(up[[6, 6]], 8);
}
