use crate::{
    BlockId,
    block::{Block, BlockSnapshot},
    errors::peer::PeerResult,
};
use async_trait::async_trait;

/// A remote node blocks can be fetched from
#[async_trait]
pub trait PeerBlockSource: Send + Sync {
    fn address(&self) -> String;

    /// Up to `limit` blocks following `last_block_id` in the peer's chain, in height order
    async fn blocks_after(&self, last_block_id: &str, limit: usize) -> PeerResult<Vec<Block>>;

    /// The highest block among `ids` which the peer also has, if any
    async fn common_block(&self, ids: &[BlockId]) -> PeerResult<Option<BlockSnapshot>>;
}
