use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<usize>,
    /// Popped items whose processing has not been completed yet.
    in_flight: usize,
    stopped: bool,
}

/// Blocking FIFO of node ids shared by the workers of one pass.
///
/// A pop waits until an id is available and returns `None` once the queue
/// is drained and no popped id is still in flight (nothing more can be
/// pushed), or after [`stop`](Self::stop). Every successful pop must be
/// matched by one [`complete`](Self::complete) call after the item's
/// children have been pushed; [`claim`](Self::claim) does this on drop.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(ids: impl IntoIterator<Item = usize>) -> Self {
        let queue = Self::new();
        queue.state.lock().items.extend(ids);
        queue
    }

    pub fn push(&self, id: usize) {
        let mut state = self.state.lock();
        if state.stopped {
            return;
        }
        state.items.push_back(id);
        drop(state);
        self.ready.notify_one();
    }

    pub fn pop(&self) -> Option<usize> {
        let mut state = self.state.lock();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(id) = state.items.pop_front() {
                state.in_flight += 1;
                return Some(id);
            }
            if state.in_flight == 0 {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Pop an id wrapped in a guard that completes it when dropped, including
    /// during unwinding.
    pub fn claim(&self) -> Option<Claim<'_>> {
        self.pop().map(|id| Claim { queue: self, id })
    }

    /// Mark one popped item as processed.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        let drained = state.in_flight == 0 && state.items.is_empty();
        drop(state);
        if drained {
            self.ready.notify_all();
        }
    }

    /// Wake every waiting worker and make all further pops return `None`.
    pub fn stop(&self) {
        self.state.lock().stopped = true;
        self.ready.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }
}

/// A popped id that is completed on drop.
#[derive(Debug)]
pub struct Claim<'a> {
    queue: &'a WorkQueue,
    id: usize,
}

impl Claim<'_> {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.queue.complete();
    }
}

/// LIFO of region ids drained by the deconvolution workers.
#[derive(Debug, Default)]
pub struct WorkStack {
    items: Mutex<Vec<usize>>,
}

impl WorkStack {
    pub fn new(ids: impl IntoIterator<Item = usize>) -> Self {
        Self {
            items: Mutex::new(ids.into_iter().collect()),
        }
    }

    pub fn pop(&self) -> Option<usize> {
        self.items.lock().pop()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }
}
