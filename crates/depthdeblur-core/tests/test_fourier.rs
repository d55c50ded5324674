use depthdeblur_core::fourier::{convolve_otf, embed_kernel, fft2d, ifft2d, impulse_spectrum, kernel_otf};
use ndarray::Array2;

#[test]
fn test_forward_then_inverse_restores_data() {
    let data = Array2::from_shape_fn((8, 6), |(r, c)| (r * 6 + c) as f32 / 48.0);
    let restored = ifft2d(&fft2d(&data));
    for (a, b) in data.iter().zip(restored.iter()) {
        assert!((*a as f64 - b).abs() < 1e-9);
    }
}

#[test]
fn test_impulse_spectrum_is_flat() {
    for v in impulse_spectrum(4, 4).iter() {
        assert!((v.re - 1.0).abs() < 1e-12 && v.im.abs() < 1e-12);
    }
}

#[test]
fn test_embedded_kernel_center_lands_on_origin() {
    let mut k = Array2::<f32>::zeros((3, 3));
    k[[1, 1]] = 0.5;
    k[[0, 0]] = 0.25;
    let padded = embed_kernel(&k, 8, 8);
    assert_eq!(padded[[0, 0]], 0.5);
    // Top-left tap wraps to the bottom-right corner.
    assert_eq!(padded[[7, 7]], 0.25);
}

#[test]
fn test_convolving_with_delta_is_identity() {
    let data = Array2::from_shape_fn((5, 7), |(r, c)| ((r + 2 * c) % 5) as f32);
    let mut k = Array2::<f32>::zeros((3, 3));
    k[[1, 1]] = 1.0;
    let out = convolve_otf(&data, &kernel_otf(&k, 5, 7));
    for (a, b) in data.iter().zip(out.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}
