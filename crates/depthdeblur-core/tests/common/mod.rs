#![allow(dead_code)]

use depthdeblur_core::deconv::DeconvolutionMethod;
use depthdeblur_core::disparity::DisparityMap;
use depthdeblur_core::edges::GradientField;
use depthdeblur_core::estimate::{
    blurred_gradients, EstimationContext, EstimationParams, RegionDeconvStore,
};
use depthdeblur_core::fourier::{convolve_otf, kernel_otf};
use depthdeblur_core::frame::{Frame, StereoImage, ViewPair};
use depthdeblur_core::pipeline::DeblurConfig;
use depthdeblur_core::psf::{KernelBank, Psf};
use depthdeblur_core::region_tree::RegionTree;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Piecewise-constant scene of overlapping rectangles on a mid-gray
/// background, values in [0.1, 0.9].
pub fn rectangle_scene(size: usize) -> Array2<f32> {
    let mut scene = Array2::<f32>::from_elem((size, size), 0.4);
    let step = size / 8;
    for i in 0..7 {
        for j in 0..7 {
            if (i * 3 + j * 5) % 4 == 0 {
                continue;
            }
            let r0 = i * step + step / 4;
            let c0 = j * step + step / 3;
            let r1 = (r0 + step * 3 / 4 + (j % 3) * step / 4).min(size);
            let c1 = (c0 + step * 2 / 3 + (i % 2) * step / 3).min(size);
            let value = 0.1 + 0.8 * (((i * 7 + j * 11) % 9) as f32 / 8.0);
            scene
                .slice_mut(ndarray::s![r0..r1, c0..c1])
                .fill(value);
        }
    }
    scene
}

/// `width x width` kernel holding a centered `box_width x box_width` box.
pub fn box_kernel(width: usize, box_width: usize) -> Array2<f32> {
    let mut k = Array2::<f32>::zeros((width, width));
    let start = (width - box_width) / 2;
    let value = 1.0 / (box_width * box_width) as f32;
    k.slice_mut(ndarray::s![start..start + box_width, start..start + box_width])
        .fill(value);
    k
}

/// Circular convolution of `image` with a centered kernel.
pub fn blur(image: &Array2<f32>, kernel: &Array2<f32>) -> Array2<f32> {
    let (h, w) = image.dim();
    convolve_otf(image, &kernel_otf(kernel, h, w))
}

/// Normalized kernel with uniform random weights.
pub fn noise_kernel(width: usize, seed: u64) -> Psf {
    let mut rng = StdRng::seed_from_u64(seed);
    let weights = Array2::from_shape_fn((width, width), |_| rng.random::<f32>());
    Psf::from_weights(weights).expect("noise kernel has positive weight")
}

/// `sum(a * b) / (|a| |b|)`.
pub fn cosine_similarity(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb)
}

/// Disparity maps splitting both views into `layers` vertical bands.
pub fn banded_disparity(h: usize, w: usize, layers: usize) -> ViewPair<DisparityMap> {
    let data = Array2::from_shape_fn((h, w), |(_, c)| (c * layers / w) as u8);
    ViewPair::new(
        DisparityMap::new(data.clone(), layers),
        DisparityMap::new(data, layers),
    )
}

pub fn mono(data: Array2<f32>) -> StereoImage {
    StereoImage::Mono(Frame::new(data, 8))
}

/// Assert that a kernel is energy preserving.
pub fn assert_normalized(psf: &Psf) {
    let weights = psf.as_array();
    assert!(weights.iter().all(|&v| v >= 0.0), "kernel has negative weights");
    approx::assert_abs_diff_eq!(weights.sum(), 1.0, epsilon = 1e-4);
}

/// Small, fast configuration for synthetic scenes.
pub fn test_config(psf_width: usize, layers: usize, threads: usize) -> DeblurConfig {
    DeblurConfig {
        psf_width,
        layers,
        threads,
        max_top_level_nodes: 1,
        ..DeblurConfig::default()
    }
}

/// Owned state behind an [`EstimationContext`] for driving the estimation
/// steps directly.
pub struct Fixture {
    pub tree: RegionTree,
    pub bank: KernelBank,
    pub latents: RegionDeconvStore,
    pub gray: ViewPair<Array2<f32>>,
    pub gradients: ViewPair<GradientField>,
    pub params: EstimationParams,
}

impl Fixture {
    /// Both views show the same scene blurred by `kernel`.
    pub fn new(
        scene: &Array2<f32>,
        kernel: &Array2<f32>,
        disparity: ViewPair<DisparityMap>,
        layers: usize,
        psf_width: usize,
    ) -> Self {
        let blurred = blur(scene, kernel);
        let gray = ViewPair::new(blurred.clone(), blurred);
        let gradients = gray.map(blurred_gradients);
        let tree = RegionTree::build(disparity, layers, 1).expect("region tree");
        let nodes = tree.len();
        let mut params = test_config(psf_width, layers, 1).estimation_params();
        params.deconvolution.selection = DeconvolutionMethod::Fft;
        Self {
            tree,
            bank: KernelBank::new(nodes),
            latents: RegionDeconvStore::new(nodes),
            gray,
            gradients,
            params,
        }
    }

    pub fn ctx(&self) -> EstimationContext<'_> {
        EstimationContext {
            tree: &self.tree,
            gray: &self.gray,
            blurred_gradients: &self.gradients,
            bank: &self.bank,
            latents: &self.latents,
            params: &self.params,
        }
    }

    pub fn seed_top_level(&self, psf: &Psf) {
        for &id in self.tree.top_level_ids() {
            self.bank.set(id, psf.clone()).expect("seed kernel");
        }
    }
}
