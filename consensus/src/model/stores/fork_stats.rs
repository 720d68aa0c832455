use super::errors::StoreResult;
use dpos_consensus_core::fork::{ForkCause, ForkEvent};

/// Reader API for `ForkStatsStore`.
pub trait ForkStatsStoreReader {
    fn all(&self) -> Vec<ForkEvent>;
    fn count(&self) -> usize;
    fn count_by_cause(&self, cause: ForkCause) -> usize;
}

/// Write API for `ForkStatsStore`. Append-only statistics sink, not consensus state.
pub trait ForkStatsStore: ForkStatsStoreReader {
    fn record(&mut self, event: ForkEvent) -> StoreResult<()>;
}

#[derive(Default)]
pub struct MemoryForkStatsStore {
    events: Vec<ForkEvent>,
}

impl MemoryForkStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForkStatsStoreReader for MemoryForkStatsStore {
    fn all(&self) -> Vec<ForkEvent> {
        self.events.clone()
    }

    fn count(&self) -> usize {
        self.events.len()
    }

    fn count_by_cause(&self, cause: ForkCause) -> usize {
        self.events.iter().filter(|e| e.cause == cause).count()
    }
}

impl ForkStatsStore for MemoryForkStatsStore {
    fn record(&mut self, event: ForkEvent) -> StoreResult<()> {
        self.events.push(event);
        Ok(())
    }
}
