use super::errors::{StoreError, StoreResult};
use dpos_consensus_core::BlockId;

/// Reader API for `TipStore`.
pub trait TipStoreReader {
    fn get(&self) -> StoreResult<BlockId>;
}

/// Write API for `TipStore`. Mutated only by the chain mutator.
pub trait TipStore: TipStoreReader {
    fn set(&mut self, id: BlockId) -> StoreResult<()>;
}

#[derive(Default)]
pub struct MemoryTipStore {
    tip: Option<BlockId>,
}

impl MemoryTipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TipStoreReader for MemoryTipStore {
    fn get(&self) -> StoreResult<BlockId> {
        self.tip.clone().ok_or_else(|| StoreError::KeyNotFound("tip".to_string()))
    }
}

impl TipStore for MemoryTipStore {
    fn set(&mut self, id: BlockId) -> StoreResult<()> {
        self.tip = Some(id);
        Ok(())
    }
}
