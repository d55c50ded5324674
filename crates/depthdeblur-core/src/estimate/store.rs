use ndarray::Array2;
use parking_lot::Mutex;

use crate::error::{DeblurError, Result};

/// Deconvolved planes per region id (one plane for gray, three for color).
///
/// Each slot is written by the single worker that processes the region.
#[derive(Debug)]
pub struct RegionDeconvStore {
    slots: Vec<Mutex<Option<Vec<Array2<f32>>>>>,
}

impl RegionDeconvStore {
    pub fn new(nodes: usize) -> Self {
        Self {
            slots: (0..nodes).map(|_| Mutex::new(None)).collect(),
        }
    }

    fn slot(&self, id: usize) -> Result<&Mutex<Option<Vec<Array2<f32>>>>> {
        self.slots.get(id).ok_or(DeblurError::UnknownNode(id))
    }

    pub fn put(&self, id: usize, planes: Vec<Array2<f32>>) -> Result<()> {
        *self.slot(id)?.lock() = Some(planes);
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<Vec<Array2<f32>>> {
        self.slots.get(id).and_then(|s| s.lock().clone())
    }

    pub fn contains(&self, id: usize) -> bool {
        self.slots.get(id).is_some_and(|s| s.lock().is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
