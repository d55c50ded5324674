mod common;

use depthdeblur_core::deconv::DeconvolutionMethod;
use depthdeblur_core::estimate::selection::candidates;
use depthdeblur_core::estimate::{select_kernel, sibling_is_reliable, CandidateSource};
use depthdeblur_core::psf::Psf;

use common::{banded_disparity, box_kernel, noise_kernel, rectangle_scene, Fixture};

fn two_leaf_fixture() -> Fixture {
    let scene = rectangle_scene(64);
    Fixture::new(&scene, &box_kernel(5, 3), banded_disparity(64, 64, 2), 2, 5)
}

// ---------------------------------------------------------------------------
// Reliability
// ---------------------------------------------------------------------------

#[test]
fn test_reliability_boundary_is_strict() {
    // mean 5.0, threshold 0.2 * 5.0 == 1.0
    assert!(!sibling_is_reliable(6.0, 5.0));
    assert!(sibling_is_reliable(5.9, 5.0));
    assert!(sibling_is_reliable(5.999, 5.0));
}

#[test]
fn test_sibling_below_mean_is_reliable() {
    assert!(sibling_is_reliable(1.0, 2.0));
}

#[test]
fn test_zero_mean_rejects_every_sibling() {
    assert!(!sibling_is_reliable(0.0, 0.0));
}

#[test]
fn test_unreliable_sibling_is_not_a_candidate() {
    let fx = two_leaf_fixture();
    let sharp = Psf::from_weights(box_kernel(5, 1)).unwrap();
    let spread = noise_kernel(5, 7);
    // Leaf 1 has a much higher entropy than its level mean.
    fx.bank.set(0, sharp.clone()).unwrap();
    fx.bank.set(1, spread).unwrap();
    fx.bank.set(2, sharp).unwrap();

    let list = candidates(&fx.ctx(), 0).unwrap();
    let sources: Vec<CandidateSource> = list.iter().map(|(s, _)| *s).collect();
    assert_eq!(sources, vec![CandidateSource::Own, CandidateSource::Parent]);
}

#[test]
fn test_reliable_sibling_is_a_candidate() {
    let fx = two_leaf_fixture();
    let psf = Psf::from_weights(box_kernel(5, 3)).unwrap();
    for id in 0..3 {
        fx.bank.set(id, psf.clone()).unwrap();
    }
    let list = candidates(&fx.ctx(), 1).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[2].0, CandidateSource::Sibling);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn test_equal_candidates_keep_own_kernel() {
    let fx = two_leaf_fixture();
    let psf = Psf::from_weights(box_kernel(5, 3)).unwrap();
    for id in 0..3 {
        fx.bank.set(id, psf.clone()).unwrap();
    }
    let selection = select_kernel(&fx.ctx(), 0).unwrap();
    assert_eq!(selection.winner, CandidateSource::Own);
    assert_eq!(selection.psf, psf);
}

#[test]
fn test_selection_is_deterministic() {
    let fx = two_leaf_fixture();
    fx.bank.set(0, noise_kernel(5, 1)).unwrap();
    fx.bank.set(1, Psf::from_weights(box_kernel(5, 3)).unwrap()).unwrap();
    fx.bank.set(2, Psf::from_weights(box_kernel(5, 3)).unwrap()).unwrap();

    let first = select_kernel(&fx.ctx(), 0).unwrap();
    let second = select_kernel(&fx.ctx(), 0).unwrap();
    assert_eq!(first.winner, second.winner);
    assert_eq!(first.psf, second.psf);
    assert_eq!(first.energy, second.energy);
}

#[test]
fn test_selection_does_not_touch_the_bank() {
    let fx = two_leaf_fixture();
    let own = noise_kernel(5, 3);
    fx.bank.set(0, own.clone()).unwrap();
    fx.bank.set(1, Psf::from_weights(box_kernel(5, 3)).unwrap()).unwrap();
    fx.bank.set(2, Psf::from_weights(box_kernel(5, 3)).unwrap()).unwrap();

    select_kernel(&fx.ctx(), 0).unwrap();
    assert_eq!(fx.bank.psf(0).unwrap(), own);
}

#[test]
fn test_irls_selection_caches_leaf_latent() {
    let mut fx = two_leaf_fixture();
    fx.params.deconvolution.selection = DeconvolutionMethod::Irls;
    fx.params.deconvolution.irls.outer_iterations = 1;
    fx.params.deconvolution.irls.cg_iterations = 5;
    let psf = Psf::from_weights(box_kernel(5, 3)).unwrap();
    for id in 0..3 {
        fx.bank.set(id, psf.clone()).unwrap();
    }

    select_kernel(&fx.ctx(), 0).unwrap();
    assert!(fx.latents.contains(0));
    assert!(!fx.latents.contains(1));

    let latent = fx.latents.get(0).unwrap();
    assert_eq!(latent.len(), 1);
    assert!(latent[0].iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_fft_selection_does_not_cache() {
    let fx = two_leaf_fixture();
    let psf = Psf::from_weights(box_kernel(5, 3)).unwrap();
    for id in 0..3 {
        fx.bank.set(id, psf.clone()).unwrap();
    }
    select_kernel(&fx.ctx(), 0).unwrap();
    assert!(!fx.latents.contains(0));
}
