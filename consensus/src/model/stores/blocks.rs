use super::errors::{StoreError, StoreResult};
use dpos_consensus_core::block::Block;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// Reader API for `BlockStore`.
pub trait BlockStoreReader {
    fn get(&self, id: &str) -> StoreResult<Arc<Block>>;
    fn get_at_height(&self, height: u64) -> StoreResult<Arc<Block>>;
    fn has(&self, id: &str) -> bool;
    /// The stored block with the greatest height strictly below `height`
    fn get_below(&self, height: u64) -> StoreResult<Arc<Block>>;
    /// Stored blocks with heights in `[offset, offset + limit)`, in height order
    fn range(&self, offset: u64, limit: u64) -> Vec<Arc<Block>>;
    fn count(&self) -> usize;
}

/// Write API for `BlockStore`. At most one block is kept per height.
pub trait BlockStore: BlockStoreReader {
    /// Inserts the block. Re-inserting an already stored block is a no-op returning `false`.
    fn insert(&mut self, block: Arc<Block>) -> StoreResult<bool>;
    fn delete(&mut self, id: &str) -> StoreResult<Arc<Block>>;
}

/// In-memory implementation of `BlockStore`, indexed by id and by height
#[derive(Default)]
pub struct MemoryBlockStore {
    by_id: HashMap<String, Arc<Block>>,
    by_height: BTreeMap<u64, String>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn block_at(&self, id: Option<&String>, key: impl ToString) -> StoreResult<Arc<Block>> {
        id.and_then(|id| self.by_id.get(id)).cloned().ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }
}

impl BlockStoreReader for MemoryBlockStore {
    fn get(&self, id: &str) -> StoreResult<Arc<Block>> {
        self.by_id.get(id).cloned().ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }

    fn get_at_height(&self, height: u64) -> StoreResult<Arc<Block>> {
        self.block_at(self.by_height.get(&height), format!("height {}", height))
    }

    fn has(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn get_below(&self, height: u64) -> StoreResult<Arc<Block>> {
        self.block_at(self.by_height.range(..height).next_back().map(|(_, id)| id), format!("below height {}", height))
    }

    fn range(&self, offset: u64, limit: u64) -> Vec<Arc<Block>> {
        self.by_height
            .range(offset..offset.saturating_add(limit))
            .filter_map(|(_, id)| self.by_id.get(id).cloned())
            .collect()
    }

    fn count(&self) -> usize {
        self.by_id.len()
    }
}

impl BlockStore for MemoryBlockStore {
    fn insert(&mut self, block: Arc<Block>) -> StoreResult<bool> {
        match self.by_height.get(&block.height) {
            Some(id) if *id == block.id => return Ok(false),
            Some(id) => return Err(StoreError::KeyAlreadyExists(format!("height {} (held by {})", block.height, id))),
            None => {}
        }
        if self.by_id.contains_key(&block.id) {
            return Err(StoreError::KeyAlreadyExists(block.id.clone()));
        }
        self.by_height.insert(block.height, block.id.clone());
        self.by_id.insert(block.id.clone(), block);
        Ok(true)
    }

    fn delete(&mut self, id: &str) -> StoreResult<Arc<Block>> {
        let block = self.by_id.remove(id).ok_or_else(|| StoreError::KeyNotFound(id.to_string()))?;
        self.by_height.remove(&block.height);
        Ok(block)
    }
}
