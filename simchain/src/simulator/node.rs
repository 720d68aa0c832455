use dpos_consensus::{
    consensus::{BlockProcessor, storage::ChainStorage},
    errors::BlockProcessResult,
    testutils::{MemoryRoundSchedule, MemoryTransactionExecutor},
};
use dpos_consensus_core::config::Config;
use dpos_core::log::Logger;
use secp256k1::Keypair;
use std::{ops::Deref, sync::Arc, thread::JoinHandle};

/// A running block processor wired to in-memory collaborators
pub struct SimNode {
    pub name: &'static str,
    pub schedule: Arc<MemoryRoundSchedule>,
    pub executor: Arc<MemoryTransactionExecutor>,
    processor: BlockProcessor,
    handles: Vec<JoinHandle<()>>,
}

impl SimNode {
    pub fn new(name: &'static str, config: &Arc<Config>, delegates: &[Keypair], storage: Arc<ChainStorage>) -> BlockProcessResult<Self> {
        let schedule = Arc::new(MemoryRoundSchedule::from_keypairs(config, delegates));
        let executor = Arc::new(MemoryTransactionExecutor::with_schedule(schedule.clone()));
        let processor = BlockProcessor::new(config.clone(), storage, schedule.clone(), executor.clone(), Logger::new("dpos_consensus"))?;
        let handles = processor.run_processors();
        Ok(Self { name, schedule, executor, processor, handles })
    }

    pub fn shutdown(mut self) {
        let handles = std::mem::take(&mut self.handles);
        self.processor.shutdown(handles);
    }
}

impl Deref for SimNode {
    type Target = BlockProcessor;

    fn deref(&self) -> &Self::Target {
        &self.processor
    }
}
