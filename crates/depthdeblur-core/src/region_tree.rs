//! Binary tree of nested depth regions.
//!
//! Leaves are single disparity layers (leaf id == layer). Adjacent nodes are
//! paired bottom-up, one level per round, until at most
//! `max_top_level_nodes` roots remain. A node left over at the end of an odd
//! round is carried up unchanged. Structure is immutable once built; kernels
//! live separately in a [`KernelBank`](crate::psf::KernelBank).

use std::ops::Range;

use ndarray::Array2;
use tracing::debug;

use crate::disparity::DisparityMap;
use crate::error::{DeblurError, Result};
use crate::frame::{View, ViewPair};

/// Pixels belonging to one region of one view.
pub type RegionMask = Array2<bool>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionNode {
    pub id: usize,
    pub parent: Option<usize>,
    pub children: Option<(usize, usize)>,
    /// Pairing round that created the node; leaves are level 0.
    pub level: usize,
    /// Disparity layers covered by the region.
    pub layers: Range<u8>,
}

impl RegionNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct RegionTree {
    nodes: Vec<RegionNode>,
    top_level: Vec<usize>,
    layers: usize,
    disparity: ViewPair<DisparityMap>,
}

impl RegionTree {
    pub fn build(
        disparity: ViewPair<DisparityMap>,
        layers: usize,
        max_top_level_nodes: usize,
    ) -> Result<Self> {
        if disparity.left.dim() != disparity.right.dim() {
            let (h, w) = disparity.right.dim();
            return Err(DeblurError::ViewMismatch(format!(
                "disparity maps differ in size: {:?} vs {w}x{h}",
                disparity.left.dim()
            )));
        }
        if layers > u8::MAX as usize {
            return Err(DeblurError::InvalidConfig(format!(
                "at most {} layers are supported, got {layers}",
                u8::MAX
            )));
        }
        let max_top = max_top_level_nodes.max(1);

        let mut nodes: Vec<RegionNode> = (0..layers)
            .map(|layer| RegionNode {
                id: layer,
                parent: None,
                children: None,
                level: 0,
                layers: layer as u8..layer as u8 + 1,
            })
            .collect();

        let mut current: Vec<usize> = (0..layers).collect();
        let mut level = 0;
        while current.len() > max_top {
            level += 1;
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                match *pair {
                    [a, b] => {
                        let id = nodes.len();
                        let range = nodes[a].layers.start..nodes[b].layers.end;
                        nodes[a].parent = Some(id);
                        nodes[b].parent = Some(id);
                        nodes.push(RegionNode {
                            id,
                            parent: None,
                            children: Some((a, b)),
                            level,
                            layers: range,
                        });
                        next.push(id);
                    }
                    [single] => next.push(single),
                    _ => {}
                }
            }
            current = next;
        }

        debug!(
            nodes = nodes.len(),
            top_level = current.len(),
            levels = level + 1,
            "Built region tree"
        );

        Ok(Self {
            nodes,
            top_level: current,
            layers,
            disparity,
        })
    }

    pub fn node(&self, id: usize) -> Result<&RegionNode> {
        self.nodes.get(id).ok_or(DeblurError::UnknownNode(id))
    }

    pub fn nodes(&self) -> &[RegionNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves (= disparity layers).
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Roots of the forest, ordered by disparity.
    pub fn top_level_ids(&self) -> &[usize] {
        &self.top_level
    }

    pub fn is_leaf(&self, id: usize) -> Result<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    /// The other child of `id`'s parent, if any.
    pub fn sibling(&self, id: usize) -> Result<Option<usize>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        Ok(self
            .node(parent)?
            .children
            .map(|(a, b)| if a == id { b } else { a }))
    }

    /// All nodes created in the same round as `id`, including `id`.
    pub fn level_peers(&self, id: usize) -> Result<Vec<usize>> {
        let level = self.node(id)?.level;
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.id)
            .collect())
    }

    pub fn mask(&self, id: usize, view: View) -> Result<RegionMask> {
        let layers = self.node(id)?.layers.clone();
        Ok(self.disparity[view].mask(layers))
    }

    pub fn masks(&self, id: usize) -> Result<ViewPair<RegionMask>> {
        Ok(ViewPair::new(
            self.mask(id, View::Left)?,
            self.mask(id, View::Right)?,
        ))
    }

    pub fn disparity(&self, view: View) -> &DisparityMap {
        &self.disparity[view]
    }
}
