use crate::model::stores::{
    blocks::MemoryBlockStore, fork_stats::MemoryForkStatsStore, round_snapshots::MemoryRoundSnapshotsStore, tip::MemoryTipStore,
};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ChainStorage {
    // Locked stores
    pub block_store: Arc<RwLock<MemoryBlockStore>>,
    pub tip_store: Arc<RwLock<MemoryTipStore>>,
    pub round_snapshots_store: Arc<RwLock<MemoryRoundSnapshotsStore>>,

    // Append-only stores
    pub fork_stats_store: Arc<RwLock<MemoryForkStatsStore>>,
}

impl ChainStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            block_store: Arc::new(RwLock::new(MemoryBlockStore::new())),
            tip_store: Arc::new(RwLock::new(MemoryTipStore::new())),
            round_snapshots_store: Arc::new(RwLock::new(MemoryRoundSnapshotsStore::new())),
            fork_stats_store: Arc::new(RwLock::new(MemoryForkStatsStore::new())),
        })
    }
}
