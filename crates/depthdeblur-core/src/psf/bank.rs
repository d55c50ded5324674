use parking_lot::RwLock;

use crate::error::{DeblurError, Result};

use super::kernel::Psf;

/// Kernel and entropy currently assigned to one region node.
#[derive(Clone, Debug, Default)]
struct NodeKernel {
    psf: Option<Psf>,
    entropy: f32,
}

/// Per-node kernel storage shared by the estimation workers.
///
/// Indexed by region node id. Each slot is written by a single worker per
/// pass, the one that popped the slot's parent.
#[derive(Debug)]
pub struct KernelBank {
    slots: Vec<RwLock<NodeKernel>>,
}

impl KernelBank {
    pub fn new(nodes: usize) -> Self {
        Self {
            slots: (0..nodes).map(|_| RwLock::new(NodeKernel::default())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: usize) -> Result<&RwLock<NodeKernel>> {
        self.slots.get(id).ok_or(DeblurError::UnknownNode(id))
    }

    /// Kernel of node `id`; an error if the node has none yet.
    pub fn psf(&self, id: usize) -> Result<Psf> {
        self.slot(id)?
            .read()
            .psf
            .clone()
            .ok_or_else(|| DeblurError::Pipeline(format!("node {id} has no kernel")))
    }

    pub fn has_psf(&self, id: usize) -> bool {
        self.slots.get(id).is_some_and(|s| s.read().psf.is_some())
    }

    pub fn entropy(&self, id: usize) -> Result<f32> {
        Ok(self.slot(id)?.read().entropy)
    }

    /// Store a kernel together with its entropy.
    pub fn set(&self, id: usize, psf: Psf) -> Result<()> {
        let entropy = psf.entropy();
        let mut slot = self.slot(id)?.write();
        slot.psf = Some(psf);
        slot.entropy = entropy;
        Ok(())
    }

    /// Replace the kernel of `id` but keep the entropy recorded when the
    /// initial estimate was stored.
    pub fn replace_psf(&self, id: usize, psf: Psf) -> Result<()> {
        self.slot(id)?.write().psf = Some(psf);
        Ok(())
    }
}
