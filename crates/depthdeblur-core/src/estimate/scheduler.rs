use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{DeblurError, Result};
use crate::pipeline::ProgressReporter;

use super::child::estimate_child_kernel;
use super::queue::WorkQueue;
use super::selection::select_kernel;
use super::EstimationContext;

/// Traversal performed by [`run_pass`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Estimate every child from its parent's kernel.
    Propagate,
    /// Re-select every child's kernel among own, parent and sibling.
    Refine,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagation"),
            Self::Refine => write!(f, "refinement"),
        }
    }
}

/// Bookkeeping of one completed pass.
#[derive(Clone, Debug, Default)]
pub struct PassReport {
    /// How many times each node id was popped.
    pub visits: Vec<usize>,
    pub leaves: usize,
}

/// Traverse the region tree breadth-first from the top-level nodes with
/// `threads` workers (the calling thread included).
///
/// The first worker error stops the queue and is returned once every
/// worker has exited.
pub fn run_pass(
    ctx: &EstimationContext<'_>,
    pass: Pass,
    threads: usize,
    reporter: &dyn ProgressReporter,
) -> Result<PassReport> {
    let top_level = ctx.tree.top_level_ids();
    if top_level.is_empty() {
        debug!(%pass, "No top-level regions, nothing to do");
        return Ok(PassReport::default());
    }
    for &id in top_level {
        if !ctx.bank.has_psf(id) {
            return Err(DeblurError::Pipeline(format!("top-level node {id} has no kernel")));
        }
    }

    let queue = WorkQueue::seeded(top_level.iter().copied());
    let visits: Vec<AtomicUsize> = (0..ctx.tree.len()).map(|_| AtomicUsize::new(0)).collect();
    let leaves = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);
    let failure: Mutex<Option<DeblurError>> = Mutex::new(None);

    let worker = || {
        while let Some(claim) = queue.claim() {
            let id = claim.id();
            if let Some(slot) = visits.get(id) {
                slot.fetch_add(1, Ordering::Relaxed);
            }
            match visit(ctx, pass, id, &queue, &leaves) {
                Ok(()) => reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1),
                Err(e) => {
                    failure.lock().get_or_insert(e);
                    queue.stop();
                }
            }
        }
    };

    let threads = threads.max(1);
    std::thread::scope(|s| {
        for _ in 1..threads {
            s.spawn(worker);
        }
        worker();
    });

    if let Some(e) = failure.into_inner() {
        return Err(e);
    }

    let leaves = leaves.into_inner();
    if leaves != ctx.tree.layers() {
        return Err(DeblurError::Pipeline(format!(
            "{pass} pass reached {leaves} leaves, expected {}",
            ctx.tree.layers()
        )));
    }

    info!(%pass, nodes = ctx.tree.len(), leaves, threads, "Pass complete");
    Ok(PassReport {
        visits: visits.into_iter().map(AtomicUsize::into_inner).collect(),
        leaves,
    })
}

fn visit(
    ctx: &EstimationContext<'_>,
    pass: Pass,
    id: usize,
    queue: &WorkQueue,
    leaves: &AtomicUsize,
) -> Result<()> {
    let Some((a, b)) = ctx.tree.node(id)?.children else {
        leaves.fetch_add(1, Ordering::Relaxed);
        return Ok(());
    };

    match pass {
        Pass::Propagate => {
            let parent = ctx.bank.psf(id)?;
            for child in [a, b] {
                let psf = estimate_child_kernel(ctx, &parent, child)?;
                ctx.bank.set(child, psf)?;
                let entropy = ctx.bank.entropy(child)?;
                debug!(node = child, parent = id, entropy, "Estimated kernel");
            }
        }
        Pass::Refine => {
            // Score both children before overwriting either.
            let first = select_kernel(ctx, a)?;
            let second = select_kernel(ctx, b)?;
            for selection in [first, second] {
                ctx.bank.replace_psf(selection.node, selection.psf)?;
            }
        }
    }

    queue.push(a);
    queue.push(b);
    Ok(())
}
