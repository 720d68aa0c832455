use async_trait::async_trait;
use dpos_consensus_core::{
    BlockId,
    api::PeerBlockSource,
    block::{Block, BlockSnapshot},
    errors::peer::{PeerError, PeerResult},
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// A peer serving a fixed chain from memory
pub struct MemoryPeer {
    address: String,
    blocks: RwLock<Vec<Block>>,
    unreachable: AtomicBool,
}

impl MemoryPeer {
    pub fn new(address: &str, mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|b| b.height);
        Self { address: address.to_string(), blocks: RwLock::new(blocks), unreachable: AtomicBool::new(false) }
    }

    pub fn push(&self, block: Block) {
        self.blocks.write().push(block);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    fn check_reachable(&self) -> PeerResult<()> {
        match self.unreachable.load(Ordering::Relaxed) {
            true => Err(PeerError::Unreachable(self.address.clone())),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl PeerBlockSource for MemoryPeer {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn blocks_after(&self, last_block_id: &str, limit: usize) -> PeerResult<Vec<Block>> {
        self.check_reachable()?;
        let blocks = self.blocks.read();
        let Some(position) = blocks.iter().position(|b| b.id == last_block_id) else {
            return Ok(vec![]);
        };
        Ok(blocks.iter().skip(position + 1).take(limit).cloned().collect())
    }

    async fn common_block(&self, ids: &[BlockId]) -> PeerResult<Option<BlockSnapshot>> {
        self.check_reachable()?;
        Ok(self.blocks.read().iter().filter(|b| ids.contains(&b.id)).max_by_key(|b| b.height).map(Block::snapshot))
    }
}
