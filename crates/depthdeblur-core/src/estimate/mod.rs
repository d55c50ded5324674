//! Hierarchical kernel estimation and region deconvolution.
//!
//! Kernels flow from the top-level regions down to the leaves (propagation
//! pass) and are then revisited top-down once more, each child choosing
//! between its own, its parent's and a reliable sibling's kernel
//! (refinement pass). The compositor finally deconvolves every region with
//! its kernel and stitches the results through the region masks.

pub mod child;
pub mod composite;
pub mod queue;
pub mod scheduler;
pub mod selection;
pub mod store;

use ndarray::Array2;

use crate::deconv::DeconvolutionConfig;
use crate::edges::gradient::{normalize_gradient_field, sobel_gradients};
use crate::edges::{GradientField, SalientEdgeParams};
use crate::filters::CoherenceParams;
use crate::frame::ViewPair;
use crate::psf::KernelBank;
use crate::region_tree::RegionTree;

pub use child::estimate_child_kernel;
pub use composite::{composite_regions, deconvolve_regions, Granularity, RegionJob};
pub use queue::{Claim, WorkQueue, WorkStack};
pub use scheduler::{run_pass, Pass, PassReport};
pub use selection::{select_kernel, sibling_is_reliable, CandidateSource, Selection};
pub use store::RegionDeconvStore;

/// Tunables shared by every estimation step.
#[derive(Clone, Debug)]
pub struct EstimationParams {
    pub psf_width: usize,
    pub deconvolution: DeconvolutionConfig,
    pub salient_edges: SalientEdgeParams,
    pub coherence: CoherenceParams,
}

/// Everything a worker needs to estimate or refine a node's kernel.
///
/// The tree, the views and their gradients are read-only; the kernel bank
/// and the latent cache are written through their own per-slot locks.
pub struct EstimationContext<'a> {
    pub tree: &'a RegionTree,
    /// Grayscale views in [0, 1].
    pub gray: &'a ViewPair<Array2<f32>>,
    /// Sobel gradients of the blurred views, normalized to [-1, 1].
    pub blurred_gradients: &'a ViewPair<GradientField>,
    pub bank: &'a KernelBank,
    /// Left-view latent images of leaves, filled during refinement.
    pub latents: &'a RegionDeconvStore,
    pub params: &'a EstimationParams,
}

/// Gradients of a blurred view with both axes sharing one scale so that the
/// largest component is +-1.
pub fn blurred_gradients(gray: &Array2<f32>) -> GradientField {
    let (mut gx, mut gy) = sobel_gradients(gray);
    normalize_gradient_field(&mut gx, &mut gy);
    (gx, gy)
}
