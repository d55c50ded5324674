use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, Zip};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deconv::{deconvolve, DeconvolutionConfig, DeconvolutionMethod};
use crate::error::{DeblurError, Result};
use crate::frame::View;
use crate::pipeline::ProgressReporter;
use crate::psf::KernelBank;
use crate::region_tree::RegionTree;

use super::queue::WorkStack;
use super::store::RegionDeconvStore;

/// Which regions are deconvolved and stitched into the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// One region per disparity layer.
    #[default]
    Leaf,
    /// The coarse top-level regions only.
    TopLevel,
}

impl Granularity {
    pub fn region_ids(self, tree: &RegionTree) -> Vec<usize> {
        match self {
            Self::Leaf => (0..tree.layers()).collect(),
            Self::TopLevel => tree.top_level_ids().to_vec(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf => write!(f, "leaf"),
            Self::TopLevel => write!(f, "top-level"),
        }
    }
}

/// One view to deconvolve region by region.
pub struct RegionJob<'a> {
    pub tree: &'a RegionTree,
    pub bank: &'a KernelBank,
    pub view: View,
    /// Channel planes of the blurred view (one for gray, three for color).
    pub planes: Vec<&'a Array2<f32>>,
    pub deconvolution: &'a DeconvolutionConfig,
    /// Left-view gray latents cached by the refinement pass.
    pub cache: Option<&'a RegionDeconvStore>,
}

impl RegionJob<'_> {
    fn cached(&self, id: usize) -> Option<Vec<Array2<f32>>> {
        let cfg = self.deconvolution;
        let reusable = self.view == View::Left
            && self.planes.len() == 1
            && cfg.selection == DeconvolutionMethod::Irls
            && cfg.final_method == DeconvolutionMethod::Irls;
        if reusable {
            self.cache.and_then(|c| c.get(id))
        } else {
            None
        }
    }

    fn deconvolve_region(&self, id: usize) -> Result<Vec<Array2<f32>>> {
        if let Some(planes) = self.cached(id) {
            debug!(node = id, view = %self.view, "Reusing cached latent");
            return Ok(planes);
        }
        let psf = self.bank.psf(id)?;
        let mask = self.tree.mask(id, self.view)?;
        Ok(self
            .planes
            .iter()
            .map(|plane| {
                let mut latent = deconvolve(
                    plane,
                    &psf,
                    Some(&mask),
                    self.deconvolution.final_method,
                    self.deconvolution,
                );
                latent.mapv_inplace(|v| v.clamp(0.0, 1.0));
                latent
            })
            .collect())
    }
}

/// Deconvolve every region in `ids` with its own kernel using `threads`
/// workers (the calling thread included).
///
/// Regions are handed out from a shared stack; each result covers the
/// whole view and is stored under the region id.
pub fn deconvolve_regions(
    job: &RegionJob<'_>,
    ids: &[usize],
    threads: usize,
    reporter: &dyn ProgressReporter,
) -> Result<RegionDeconvStore> {
    let store = RegionDeconvStore::new(job.tree.len());
    let stack = WorkStack::new(ids.iter().copied());
    let done = AtomicUsize::new(0);
    let failure: Mutex<Option<DeblurError>> = Mutex::new(None);

    let worker = || {
        while let Some(id) = stack.pop() {
            let result = job
                .deconvolve_region(id)
                .and_then(|planes| store.put(id, planes));
            match result {
                Ok(()) => reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1),
                Err(e) => {
                    failure.lock().get_or_insert(e);
                    stack.clear();
                }
            }
        }
    };

    std::thread::scope(|s| {
        for _ in 1..threads.max(1) {
            s.spawn(worker);
        }
        worker();
    });

    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    info!(view = %job.view, regions = ids.len(), "Deconvolved regions");
    Ok(store)
}

/// Copy each stored region into the output through its mask, in `ids` order.
pub fn composite_regions(
    tree: &RegionTree,
    store: &RegionDeconvStore,
    ids: &[usize],
    view: View,
    planes: usize,
) -> Result<Vec<Array2<f32>>> {
    let dim = tree.disparity(view).dim();
    let mut output = vec![Array2::<f32>::zeros(dim); planes];

    for &id in ids {
        let region = store
            .get(id)
            .ok_or_else(|| DeblurError::Pipeline(format!("region {id} was not deconvolved")))?;
        if region.len() != planes {
            return Err(DeblurError::Pipeline(format!(
                "region {id} has {} planes, expected {planes}",
                region.len()
            )));
        }
        let mask = tree.mask(id, view)?;
        for (dst, src) in output.iter_mut().zip(&region) {
            Zip::from(dst).and(src).and(&mask).for_each(|d, &s, &m| {
                if m {
                    *d = s;
                }
            });
        }
    }

    Ok(output)
}
