//! Bounded, deduplicated, order-preserving pending-delivery queue.

use smallvec::SmallVec;

use crate::key::OverrideKey;
use crate::table::OverrideRecord;

/// How many overrides may await delivery at once.
pub const PENDING_CAPACITY: usize = 3;

/// What happened to a pushed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The key is already waiting; the push was a no-op.
    AlreadyQueued,
    /// All slots held distinct keys; the record was dropped and must be
    /// re-requested by its producer.
    Dropped,
}

/// FIFO of overrides awaiting a safe delivery moment. Occupancy is
/// contiguous and no two entries ever share a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    entries: SmallVec<[OverrideRecord; PENDING_CAPACITY]>,
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OverrideRecord) -> PushOutcome {
        if self.contains_key(record.key) {
            return PushOutcome::AlreadyQueued;
        }
        if self.entries.len() >= PENDING_CAPACITY {
            return PushOutcome::Dropped;
        }
        self.entries.push(record);
        PushOutcome::Queued
    }

    pub fn pop_front(&mut self) -> Option<OverrideRecord> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    #[must_use]
    pub fn peek_front(&self) -> Option<&OverrideRecord> {
        self.entries.first()
    }

    #[must_use]
    pub fn contains_key(&self, key: OverrideKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverrideRecord> {
        self.entries.iter()
    }
}
