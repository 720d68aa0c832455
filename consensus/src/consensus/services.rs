use crate::{
    model::stores::fork_stats::MemoryForkStatsStore,
    processes::{block_validator::BlockValidator, fork_resolver::ForkResolver, slot_validator::SlotValidator},
};
use dpos_consensus_core::{api::RoundScheduleProvider, config::Config};
use dpos_core::log::Logger;
use parking_lot::RwLock;
use std::sync::Arc;

/// Stateless processing services shared by the sequencer jobs and read-only queries
#[derive(Clone)]
pub struct ChainServices {
    pub block_validator: BlockValidator,
    pub slot_validator: SlotValidator,
    pub fork_resolver: ForkResolver,
}

impl ChainServices {
    pub fn new(
        config: &Config,
        schedule: Arc<dyn RoundScheduleProvider>,
        fork_stats_store: Arc<RwLock<MemoryForkStatsStore>>,
        log: &Logger,
    ) -> Self {
        let block_validator = BlockValidator::new(config);
        let slot_validator = SlotValidator::new(config, schedule, log.clone());
        let fork_resolver = ForkResolver::new(config, block_validator.clone(), slot_validator.clone(), fork_stats_store, log.clone());
        Self { block_validator, slot_validator, fork_resolver }
    }
}
