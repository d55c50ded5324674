mod common;

use depthdeblur_core::deconv::{
    deconvolve, deconvolve_fft, deconvolve_irls, DeconvolutionConfig, DeconvolutionMethod, IrlsParams,
};
use depthdeblur_core::psf::Psf;
use ndarray::Array2;

use common::{blur, box_kernel, rectangle_scene};

fn mean_abs_error(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    (a - b).mapv(f32::abs).mean().unwrap_or(0.0)
}

fn fast_config() -> DeconvolutionConfig {
    DeconvolutionConfig {
        fft_weight: 1e-3,
        irls: IrlsParams {
            outer_iterations: 2,
            cg_iterations: 15,
            ..IrlsParams::default()
        },
        ..DeconvolutionConfig::default()
    }
}

#[test]
fn test_fft_deconvolution_sharpens() {
    let scene = rectangle_scene(64);
    let kernel = box_kernel(5, 3);
    let blurred = blur(&scene, &kernel);
    let psf = Psf::from_weights(kernel).unwrap();

    let latent = deconvolve(&blurred, &psf, None, DeconvolutionMethod::Fft, &fast_config());
    assert!(mean_abs_error(&latent, &scene) < mean_abs_error(&blurred, &scene));
}

#[test]
fn test_irls_deconvolution_sharpens() {
    let scene = rectangle_scene(64);
    let kernel = box_kernel(5, 3);
    let blurred = blur(&scene, &kernel);
    let psf = Psf::from_weights(kernel).unwrap();

    let latent = deconvolve(&blurred, &psf, None, DeconvolutionMethod::Irls, &fast_config());
    assert!(mean_abs_error(&latent, &scene) < mean_abs_error(&blurred, &scene));
}

#[test]
fn test_irls_mask_focuses_on_region() {
    let scene = rectangle_scene(64);
    let kernel = box_kernel(5, 3);
    let blurred = blur(&scene, &kernel);
    let psf = Psf::from_weights(kernel).unwrap();
    let mask = Array2::from_shape_fn((64, 64), |(_, c)| c < 32);

    let latent = deconvolve(&blurred, &psf, Some(&mask), DeconvolutionMethod::Irls, &fast_config());
    let inside = |a: &Array2<f32>| {
        a.indexed_iter()
            .filter(|((_, c), _)| *c >= 4 && *c < 28)
            .map(|((r, c), &v)| (v - scene[[r, c]]).abs())
            .sum::<f32>()
    };
    assert!(inside(&latent) < inside(&blurred));
}

#[test]
fn test_fft_ignores_mask() {
    let scene = rectangle_scene(32);
    let psf = Psf::from_weights(box_kernel(3, 3)).unwrap();
    let blurred = blur(&scene, psf.as_array());
    let mask = Array2::from_elem((32, 32), false);
    let config = fast_config();

    let masked = deconvolve(&blurred, &psf, Some(&mask), DeconvolutionMethod::Fft, &config);
    let unmasked = deconvolve(&blurred, &psf, None, DeconvolutionMethod::Fft, &config);
    assert_eq!(masked, unmasked);
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

fn checker(n: usize, cell: usize, lo: f32, hi: f32) -> Array2<f32> {
    Array2::from_shape_fn((n, n), |(r, c)| if (r / cell + c / cell) % 2 == 0 { hi } else { lo })
}

#[test]
fn test_fft_delta_kernel_without_prior_is_identity() {
    let data = Array2::from_shape_fn((16, 16), |(r, c)| ((r * 3 + c) % 7) as f32 / 7.0);
    let out = deconvolve_fft(&data, &Psf::delta(3), 0.0);
    for (a, b) in data.iter().zip(out.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn test_fft_halves_a_mild_blur() {
    let sharp = checker(32, 8, 0.2, 0.8);
    let mut k = Array2::<f32>::zeros((3, 3));
    k[[1, 1]] = 0.6;
    k[[1, 0]] = 0.2;
    k[[1, 2]] = 0.2;
    let psf = Psf::from_weights(k).unwrap();
    let blurred = blur(&sharp, psf.as_array());
    let restored = deconvolve_fft(&blurred, &psf, 1e-4);
    assert!(mean_abs_error(&restored, &sharp) < mean_abs_error(&blurred, &sharp) * 0.5);
}

#[test]
fn test_irls_keeps_sharp_input_under_delta_kernel() {
    let sharp = checker(24, 6, 0.25, 0.75);
    let out = deconvolve_irls(&sharp, &Psf::delta(3), None, &IrlsParams::default());
    let err = mean_abs_error(&out, &sharp);
    assert!(err < 0.02, "mean error {err}");
}

#[test]
fn test_irls_reduces_box_blur_error() {
    let sharp = checker(32, 6, 0.25, 0.75);
    let psf = Psf::from_weights(Array2::from_elem((3, 3), 1.0)).unwrap();
    let blurred = blur(&sharp, psf.as_array());
    let params = IrlsParams {
        weight: 1e-4,
        outer_iterations: 2,
        cg_iterations: 30,
        ..IrlsParams::default()
    };
    let restored = deconvolve_irls(&blurred, &psf, None, &params);
    assert!(mean_abs_error(&restored, &sharp) < mean_abs_error(&blurred, &sharp));
}
