pub mod sequencer;

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ProcessingCounters {
    pub operations_submitted: AtomicU64,
    pub operations_completed: AtomicU64,
    pub operations_failed: AtomicU64,
    pub blocks_applied: AtomicU64,
}

impl ProcessingCounters {
    pub fn snapshot(&self) -> ProcessingCountersSnapshot {
        ProcessingCountersSnapshot {
            operations_submitted: self.operations_submitted.load(Ordering::SeqCst),
            operations_completed: self.operations_completed.load(Ordering::SeqCst),
            operations_failed: self.operations_failed.load(Ordering::SeqCst),
            blocks_applied: self.blocks_applied.load(Ordering::SeqCst),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessingCountersSnapshot {
    pub operations_submitted: u64,
    pub operations_completed: u64,
    pub operations_failed: u64,
    pub blocks_applied: u64,
}
