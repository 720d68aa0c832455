use super::errors::{StoreError, StoreResult};
use dpos_consensus_core::round::RoundSnapshot;
use std::collections::BTreeMap;

/// Reader API for `RoundSnapshotsStore`.
pub trait RoundSnapshotsStoreReader {
    fn get(&self, round: u64) -> StoreResult<RoundSnapshot>;
    fn has(&self, round: u64) -> bool;
    fn rounds(&self) -> Vec<u64>;
}

/// Write API for `RoundSnapshotsStore`. A snapshot is keyed by the round it was taken on entry to.
pub trait RoundSnapshotsStore: RoundSnapshotsStoreReader {
    fn set(&mut self, round: u64, snapshot: RoundSnapshot) -> StoreResult<()>;
    fn delete(&mut self, round: u64) -> StoreResult<RoundSnapshot>;
}

#[derive(Default)]
pub struct MemoryRoundSnapshotsStore {
    snapshots: BTreeMap<u64, RoundSnapshot>,
}

impl MemoryRoundSnapshotsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundSnapshotsStoreReader for MemoryRoundSnapshotsStore {
    fn get(&self, round: u64) -> StoreResult<RoundSnapshot> {
        self.snapshots.get(&round).cloned().ok_or_else(|| StoreError::KeyNotFound(format!("round snapshot {}", round)))
    }

    fn has(&self, round: u64) -> bool {
        self.snapshots.contains_key(&round)
    }

    fn rounds(&self) -> Vec<u64> {
        self.snapshots.keys().copied().collect()
    }
}

impl RoundSnapshotsStore for MemoryRoundSnapshotsStore {
    fn set(&mut self, round: u64, snapshot: RoundSnapshot) -> StoreResult<()> {
        self.snapshots.insert(round, snapshot);
        Ok(())
    }

    fn delete(&mut self, round: u64) -> StoreResult<RoundSnapshot> {
        self.snapshots.remove(&round).ok_or_else(|| StoreError::KeyNotFound(format!("round snapshot {}", round)))
    }
}
