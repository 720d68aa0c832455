use dpos_consensus::{
    consensus::{storage::ChainStorage, test_consensus::TestConsensus},
    model::stores::blocks::{BlockStore, BlockStoreReader},
};
use dpos_consensus_core::{
    block::Block,
    config::{Config, ConfigBuilder, params::DEVNET_PARAMS},
};
use std::{ops::Deref, sync::Arc, thread::JoinHandle};

/// Four delegates, so round boundaries fall on heights 4, 8, ...
#[allow(dead_code)]
pub fn config() -> Config {
    ConfigBuilder::new(DEVNET_PARAMS).edit_consensus_params(|p| p.active_delegates = 4).enable_sanity_checks().build()
}

/// A running test consensus, shut down on drop
pub struct TestNode {
    consensus: TestConsensus,
    handles: Vec<JoinHandle<()>>,
}

#[allow(dead_code)]
impl TestNode {
    pub fn new() -> Self {
        Self::start(TestConsensus::new(&config()))
    }

    pub fn start(consensus: TestConsensus) -> Self {
        let handles = consensus.init();
        Self { consensus, handles }
    }

    /// Blocks at heights `[from, to]` as stored by this node
    pub fn stored_blocks(&self, from: u64, to: u64) -> Vec<Block> {
        self.storage().block_store.read().range(from, to + 1 - from).iter().map(|b| (**b).clone()).collect()
    }
}

impl Deref for TestNode {
    type Target = TestConsensus;

    fn deref(&self) -> &Self::Target {
        &self.consensus
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        self.consensus.shutdown(handles);
    }
}

/// Forges a valid chain of `count` blocks on top of genesis, without processing it. Every other
/// block carries a transfer.
#[allow(dead_code)]
pub fn forge_chain(count: usize) -> Vec<Block> {
    let forger = TestConsensus::new(&config());
    let mut blocks: Vec<Block> = vec![config().genesis.build_block()];
    for i in 0..count {
        let transactions = if i % 2 == 1 { vec![forger.generator.transfer(100 + i as u64)] } else { vec![] };
        let parent = blocks.last().expect("genesis is first");
        let block = forger.generator.next_block_with(parent, transactions);
        blocks.push(block);
    }
    blocks
}

/// Storage holding `blocks` but no tip, as left behind by a node whose chain state must be rebuilt
#[allow(dead_code)]
pub fn stored(blocks: &[Block]) -> Arc<ChainStorage> {
    let storage = ChainStorage::new();
    for block in blocks {
        storage.block_store.write().insert(Arc::new(block.clone())).unwrap();
    }
    storage
}

/// Re-signs an edited block with its generator's test key pair
#[allow(dead_code)]
pub fn resign(block: Block) -> Block {
    TestConsensus::new(&config()).generator.resign(block)
}
