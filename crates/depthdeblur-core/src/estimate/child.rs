use tracing::{debug, warn};

use crate::deconv::deconvolve;
use crate::edges::gradient::apply_mask;
use crate::edges::salient_edge_map;
use crate::error::{DeblurError, Result};
use crate::frame::{View, ViewPair};
use crate::psf::{estimate_joint_psf, Psf};

use super::EstimationContext;

/// Estimate the kernel of `child` starting from its parent's kernel.
///
/// Both views are deconvolved with the parent kernel, their salient edges
/// inside the child's masks are extracted and the joint solver fits a kernel
/// mapping those edges onto the blurred gradients of the region.
///
/// A child whose mask is empty in either view inherits the parent kernel
/// unchanged, as does one whose joint solve degenerates.
pub fn estimate_child_kernel(ctx: &EstimationContext<'_>, parent: &Psf, child: usize) -> Result<Psf> {
    let masks = ctx.tree.masks(child)?;
    if View::BOTH.iter().any(|&v| !masks[v].iter().any(|&m| m)) {
        debug!(node = child, "Empty region mask, inheriting parent kernel");
        return Ok(parent.clone());
    }

    let params = ctx.params;
    let per_view = |view: View| {
        let mask = &masks[view];
        let latent = deconvolve(
            &ctx.gray[view],
            parent,
            Some(mask),
            params.deconvolution.selection,
            &params.deconvolution,
        );
        let salient = salient_edge_map(&latent, params.psf_width, mask, &params.salient_edges);
        let (bx, by) = &ctx.blurred_gradients[view];
        let blurred = (apply_mask(bx, mask), apply_mask(by, mask));
        (salient, blurred)
    };
    let (left_salient, left_blurred) = per_view(View::Left);
    let (right_salient, right_blurred) = per_view(View::Right);

    let salient = ViewPair::new(left_salient, right_salient);
    let blurred = ViewPair::new(left_blurred, right_blurred);
    match estimate_joint_psf(&blurred, &salient, params.psf_width) {
        Ok(psf) => Ok(psf),
        Err(DeblurError::DegenerateKernel(reason)) => {
            warn!(node = child, %reason, "Joint solve degenerated, inheriting parent kernel");
            Ok(parent.clone())
        }
        Err(e) => Err(e),
    }
}
