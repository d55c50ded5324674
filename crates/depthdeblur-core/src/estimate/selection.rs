use ndarray::Array2;
use tracing::debug;

use crate::consts::{RELIABILITY_FACTOR, SELECTION_SMOOTH_WINDOW};
use crate::deconv::{deconvolve, DeconvolutionMethod};
use crate::edges::gradient_correlation;
use crate::error::{DeblurError, Result};
use crate::filters::{coherence_filter, gaussian_blur_window};
use crate::frame::View;
use crate::psf::Psf;

use super::EstimationContext;

/// Where a candidate kernel comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateSource {
    Own,
    Parent,
    Sibling,
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Own => write!(f, "own"),
            Self::Parent => write!(f, "parent"),
            Self::Sibling => write!(f, "sibling"),
        }
    }
}

/// Outcome of refining one node.
#[derive(Clone, Debug)]
pub struct Selection {
    pub node: usize,
    pub winner: CandidateSource,
    pub psf: Psf,
    pub energy: f32,
}

/// A sibling kernel is trusted when its entropy exceeds the mean entropy of
/// its level by less than `RELIABILITY_FACTOR` of that mean.
pub fn sibling_is_reliable(entropy: f32, level_mean: f32) -> bool {
    entropy - level_mean < RELIABILITY_FACTOR * level_mean
}

fn level_mean_entropy(ctx: &EstimationContext<'_>, id: usize) -> Result<f32> {
    let peers = ctx.tree.level_peers(id)?;
    if peers.is_empty() {
        return Ok(0.0);
    }
    let mut sum = 0.0f32;
    for &peer in &peers {
        sum += ctx.bank.entropy(peer)?;
    }
    Ok(sum / peers.len() as f32)
}

/// Candidate kernels of `id` in preference order: own, parent, and the
/// sibling's when it is reliable.
pub fn candidates(ctx: &EstimationContext<'_>, id: usize) -> Result<Vec<(CandidateSource, Psf)>> {
    let node = ctx.tree.node(id)?;
    let mut list = vec![(CandidateSource::Own, ctx.bank.psf(id)?)];
    if let Some(parent) = node.parent {
        list.push((CandidateSource::Parent, ctx.bank.psf(parent)?));
    }
    if let Some(sibling) = ctx.tree.sibling(id)? {
        let entropy = ctx.bank.entropy(sibling)?;
        let mean = level_mean_entropy(ctx, sibling)?;
        if sibling_is_reliable(entropy, mean) {
            list.push((CandidateSource::Sibling, ctx.bank.psf(sibling)?));
        } else {
            debug!(node = id, sibling, entropy, mean, "Sibling kernel unreliable");
        }
    }
    Ok(list)
}

/// Deconvolve the left view with `psf` and measure how far the latent image
/// is from its own shock-filtered version. Lower is sharper.
pub fn candidate_energy(
    ctx: &EstimationContext<'_>,
    psf: &Psf,
    mask: &Array2<bool>,
) -> (f32, Array2<f32>) {
    let params = ctx.params;
    let mut latent = deconvolve(
        &ctx.gray[View::Left],
        psf,
        Some(mask),
        params.deconvolution.selection,
        &params.deconvolution,
    );
    latent.mapv_inplace(|v| v.clamp(0.0, 1.0));

    let smoothed = gaussian_blur_window(&latent, SELECTION_SMOOTH_WINDOW);
    let shocked = coherence_filter(&smoothed, &params.coherence);
    let energy = 1.0 - gradient_correlation(&latent, &shocked, mask);
    (energy, latent)
}

/// Pick the best kernel for `id` without modifying the kernel bank.
///
/// Ties keep the earlier candidate. For leaves refined with the IRLS
/// solver, the winning latent image is cached for the compositor.
pub fn select_kernel(ctx: &EstimationContext<'_>, id: usize) -> Result<Selection> {
    let mask = ctx.tree.mask(id, View::Left)?;
    let mut best: Option<(CandidateSource, Psf, f32, Array2<f32>)> = None;

    for (source, psf) in candidates(ctx, id)? {
        let (energy, latent) = candidate_energy(ctx, &psf, &mask);
        debug!(node = id, candidate = %source, energy, "Scored candidate");
        let better = best.as_ref().is_none_or(|(_, _, e, _)| energy < *e);
        if better {
            best = Some((source, psf, energy, latent));
        }
    }

    let (winner, psf, energy, latent) =
        best.ok_or_else(|| DeblurError::Pipeline(format!("node {id} has no candidates")))?;

    if ctx.tree.is_leaf(id)? && ctx.params.deconvolution.selection == DeconvolutionMethod::Irls {
        ctx.latents.put(id, vec![latent])?;
    }

    debug!(node = id, %winner, energy, "Selected kernel");
    Ok(Selection {
        node: id,
        winner,
        psf,
        energy,
    })
}
