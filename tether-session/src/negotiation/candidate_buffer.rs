use std::collections::VecDeque;
use tether_core::CandidateInit;

/// Remote candidates received before the remote description they belong to.
///
/// Unbounded; drained in arrival order.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    queue: VecDeque<CandidateInit>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `candidate` and returns the new length.
    pub fn push(&mut self, candidate: CandidateInit) -> usize {
        self.queue.push_back(candidate);
        self.queue.len()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = CandidateInit> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
