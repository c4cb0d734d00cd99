//! Latest-results slot shared by the crawl jobs and the read path.
//!
//! The slot holds at most one batch. Writers replace it wholesale, readers
//! clone an `Arc` out of it, so a reader sees either the old batch or the
//! new one and never waits on a crawl.

use std::sync::{Arc, PoisonError, RwLock};

use crate::result::ResultBatch;

#[derive(Debug, Default)]
struct Slot {
    batch: Option<Arc<ResultBatch>>,
    generation: u64,
}

/// Holds the batch of the most recently completed crawl.
#[derive(Debug, Default)]
pub struct ResultStore {
    slot: RwLock<Slot>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest batch, or `None` if no crawl has completed.
    pub fn latest(&self) -> Option<Arc<ResultBatch>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .batch
            .clone()
    }

    /// Replaces the batch unconditionally.
    pub fn replace(&self, batch: ResultBatch) {
        let batch = Arc::new(batch);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.batch = Some(batch);
    }

    /// Replaces the batch unless a later generation has already written or
    /// cleared the slot. Returns whether the write happened.
    pub fn replace_if_current(&self, generation: u64, batch: ResultBatch) -> bool {
        let batch = Arc::new(batch);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if generation < slot.generation {
            return false;
        }
        slot.generation = generation;
        slot.batch = Some(batch);
        true
    }

    /// Empties the slot.
    pub fn clear(&self) {
        self.slot.write().unwrap_or_else(PoisonError::into_inner).batch = None;
    }

    /// Empties the slot on behalf of `generation`, fencing off writes from
    /// earlier generations.
    pub fn clear_for(&self, generation: u64) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation = slot.generation.max(generation);
        slot.batch = None;
    }
}
