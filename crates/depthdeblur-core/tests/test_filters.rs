use depthdeblur_core::filters::gaussian_blur::window_sigma;
use depthdeblur_core::filters::morphology::{dilate, erode};
use depthdeblur_core::filters::{coherence_filter, gaussian_blur_window, CoherenceParams};
use ndarray::Array2;

// ---------------------------------------------------------------------------
// Gaussian blur
// ---------------------------------------------------------------------------

#[test]
fn test_five_pixel_window_sigma() {
    approx::assert_abs_diff_eq!(window_sigma(5), 1.1, epsilon = 1e-6);
}

#[test]
fn test_blur_preserves_constant_image() {
    let data = Array2::from_elem((16, 16), 0.4f32);
    let out = gaussian_blur_window(&data, 5);
    assert!(out.iter().all(|v| (v - 0.4).abs() < 1e-5));
}

// ---------------------------------------------------------------------------
// Morphology
// ---------------------------------------------------------------------------

#[test]
fn test_bright_pixel_spreads_under_dilation_and_vanishes_under_erosion() {
    let mut data = Array2::<f32>::zeros((5, 5));
    data[[2, 2]] = 1.0;
    let dilated = dilate(&data);
    assert_eq!(dilated[[1, 1]], 1.0);
    assert_eq!(dilated[[0, 0]], 0.0);
    assert_eq!(erode(&data)[[2, 2]], 0.0);
}

// ---------------------------------------------------------------------------
// Coherence filter
// ---------------------------------------------------------------------------

#[test]
fn test_constant_image_is_a_fixed_point() {
    let data = Array2::from_elem((12, 12), 0.3f32);
    let out = coherence_filter(&data, &CoherenceParams::default());
    assert!(out.iter().all(|v| (v - 0.3).abs() < 1e-6));
}

#[test]
fn test_output_stays_within_input_range() {
    let data = Array2::from_shape_fn((16, 16), |(r, c)| {
        (((r as f32) * 0.7).sin() * ((c as f32) * 0.4).cos() + 1.0) * 0.5
    });
    let (lo, hi) = data
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let out = coherence_filter(&data, &CoherenceParams::default());
    for &v in out.iter() {
        assert!(v >= lo - 1e-6 && v <= hi + 1e-6);
    }
}
