use super::{BlockProcessor, storage::ChainStorage};
use crate::{
    model::stores::fork_stats::ForkStatsStoreReader,
    processes::fork_resolver::BlockOutcome,
    testutils::{ChainGenerator, MemoryRoundSchedule, MemoryTransactionExecutor},
};
use dpos_consensus_core::{block::Block, config::Config, fork::ForkCause, tx::Transaction};
use dpos_core::log::{LogCapture, Logger};
use std::{ops::Deref, sync::Arc, thread::JoinHandle};

/// A block processor wired to in-memory collaborators, with one key pair per active delegate and
/// every log line captured
pub struct TestConsensus {
    processor: BlockProcessor,
    pub schedule: Arc<MemoryRoundSchedule>,
    pub executor: Arc<MemoryTransactionExecutor>,
    pub generator: ChainGenerator,
    pub capture: Arc<LogCapture>,
}

impl TestConsensus {
    pub fn new(config: &Config) -> Self {
        Self::with_storage(config, ChainStorage::new())
    }

    /// Builds over existing storage, e.g. one pre-populated with blocks to replay
    pub fn with_storage(config: &Config, storage: Arc<ChainStorage>) -> Self {
        let config = Arc::new(config.clone());
        let keypairs = ChainGenerator::delegate_keypairs(config.active_delegates as usize);
        let schedule = Arc::new(MemoryRoundSchedule::from_keypairs(&config, &keypairs));
        let executor = Arc::new(MemoryTransactionExecutor::with_schedule(schedule.clone()));
        let capture = LogCapture::new();
        let processor = BlockProcessor::new(
            config.clone(),
            storage,
            schedule.clone(),
            executor.clone(),
            Logger::with_capture("dpos_consensus", capture.clone()),
        )
        .expect("storage holds a consistent tip");
        let generator = ChainGenerator::new(&config, schedule.clone(), keypairs);
        Self { processor, schedule, executor, generator, capture }
    }

    pub fn init(&self) -> Vec<JoinHandle<()>> {
        self.processor.run_processors()
    }

    pub fn tip(&self) -> Arc<Block> {
        self.processor.last_block().expect("tip is always stored")
    }

    /// Forges the next block on the tip with the scheduled delegate and processes it
    pub async fn add_block(&self, transactions: Vec<Transaction>) -> Arc<Block> {
        let block = self.generator.next_block_with(&self.tip(), transactions);
        let outcome = self.processor.on_receive_block(block.clone()).await.expect("generated block is valid");
        assert_eq!(outcome, BlockOutcome::Accepted);
        Arc::new(block)
    }

    pub async fn add_blocks(&self, count: usize) -> Vec<Arc<Block>> {
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            blocks.push(self.add_block(vec![]).await);
        }
        blocks
    }

    pub fn fork_count(&self, cause: ForkCause) -> usize {
        self.processor.storage().fork_stats_store.read().count_by_cause(cause)
    }
}

impl Deref for TestConsensus {
    type Target = BlockProcessor;

    fn deref(&self) -> &Self::Target {
        &self.processor
    }
}
