use crate::{
    errors::{BlockProcessError, BlockProcessResult},
    model::stores::fork_stats::{ForkStatsStore, MemoryForkStatsStore},
    processes::{block_validator::BlockValidator, chain_mutator::ChainMutator, slot_validator::SlotValidator},
};
use dpos_consensus_core::{
    block::Block,
    config::params::Params,
    errors::block::RuleError,
    fork::{ForkCause, ForkEvent},
};
use dpos_core::log::{Level, Logger};
use parking_lot::RwLock;
use std::sync::Arc;

/// Max number of blocks a divergent successor may roll back
const FORK_ONE_MAX_UNDO: usize = 2;

/// Max number of blocks a competing sibling may roll back
const FORK_FIVE_MAX_UNDO: usize = 1;

/// Shape of an incoming block relative to the current tip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainRelation {
    AlreadyProcessed,
    DirectExtension,
    CompetingSibling,
    DivergentSuccessor,
    Unrelated,
}

/// Classifies `incoming` against `tip`. The first matching relation wins.
pub fn classify_block(incoming: &Block, tip: &Block) -> ChainRelation {
    if incoming.id == tip.id {
        ChainRelation::AlreadyProcessed
    } else if incoming.previous_block.as_deref() == Some(tip.id.as_str()) && incoming.height == tip.height + 1 {
        ChainRelation::DirectExtension
    } else if incoming.height == tip.height && incoming.previous_block == tip.previous_block {
        ChainRelation::CompetingSibling
    } else if incoming.height == tip.height + 1 {
        ChainRelation::DivergentSuccessor
    } else {
        ChainRelation::Unrelated
    }
}

/// Whether the current tip wins against a competing incoming block: the earlier timestamp wins,
/// ties go to the lower id (ids compare as strings)
pub fn tip_stands(incoming: &Block, tip: &Block) -> bool {
    incoming.timestamp > tip.timestamp || (incoming.timestamp == tip.timestamp && incoming.id > tip.id)
}

/// Result of processing a block which did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block extended the chain
    Accepted,
    AlreadyProcessed,
    /// The block has no relation to the tip and was ignored
    Discarded,
    /// A competing block lost against the current tip
    LastBlockStands,
    /// The chain was rolled back by `undone` blocks and the incoming block became the tip
    ForkRecovered { undone: usize },
}

#[derive(Clone)]
pub struct ForkResolver {
    params: Params,
    block_validator: BlockValidator,
    slot_validator: SlotValidator,
    fork_stats_store: Arc<RwLock<MemoryForkStatsStore>>,
    log: Logger,
}

impl ForkResolver {
    pub fn new(
        params: &Params,
        block_validator: BlockValidator,
        slot_validator: SlotValidator,
        fork_stats_store: Arc<RwLock<MemoryForkStatsStore>>,
        log: Logger,
    ) -> Self {
        Self { params: params.clone(), block_validator, slot_validator, fork_stats_store, log }
    }

    /// Classifies `block` against the tip of `chain` and dispatches it
    pub fn process_block(&self, chain: &mut ChainMutator, block: Arc<Block>) -> BlockProcessResult<BlockOutcome> {
        match classify_block(&block, chain.tip()) {
            ChainRelation::AlreadyProcessed => {
                self.log.event(Level::Debug, "Block already processed", &block.id);
                Ok(BlockOutcome::AlreadyProcessed)
            }
            ChainRelation::DirectExtension => self.receive_block(chain, block).map(|_| BlockOutcome::Accepted),
            ChainRelation::CompetingSibling => self.receive_fork_five(chain, block),
            ChainRelation::DivergentSuccessor => self.receive_fork_one(chain, block),
            ChainRelation::Unrelated => {
                self.log.warn(format_args!(
                    "Discarded block that does not match with current chain: {} height: {} round: {} slot: {} generator: {}",
                    block.id,
                    block.height,
                    self.params.round_of(block.height),
                    self.params.slot_of(block.timestamp),
                    block.generator_public_key
                ));
                Ok(BlockOutcome::Discarded)
            }
        }
    }

    /// Applies a block that directly extends the tip
    pub fn receive_block(&self, chain: &mut ChainMutator, block: Arc<Block>) -> BlockProcessResult<()> {
        self.log_received(&block);
        if let Err(err) = self.slot_validator.verify_slot(&block) {
            if matches!(err.rule(), Some(RuleError::SlotMismatch { .. })) {
                self.record_fork(&block, ForkCause::WrongSlotGenerator);
            }
            return Err(err);
        }
        if let Err(err) = self.block_validator.validate_live(&block, chain.tip()) {
            self.log.event(Level::Error, format_args!("Block {} verification failed", block.id), &err.to_string());
            return Err(err.into());
        }
        chain.apply(block)
    }

    /// Divergent successor: the incoming block is at the next height but its parent is not the tip
    fn receive_fork_one(&self, chain: &mut ChainMutator, block: Arc<Block>) -> BlockProcessResult<BlockOutcome> {
        self.record_fork(&block, ForkCause::DivergentSuccessor);
        if tip_stands(&block, chain.tip()) {
            self.log.info("Last block stands");
            return Ok(BlockOutcome::LastBlockStands);
        }
        self.log.info("Last block and parent loses");
        self.validate_recovery_candidate(&block)?;
        self.recover(chain, block, FORK_ONE_MAX_UNDO)
    }

    /// Competing sibling: same height and parent as the tip
    fn receive_fork_five(&self, chain: &mut ChainMutator, block: Arc<Block>) -> BlockProcessResult<BlockOutcome> {
        self.record_fork(&block, ForkCause::CompetingSibling);
        if block.generator_public_key == chain.tip().generator_public_key {
            self.log.event(Level::Warn, "Delegate forging on multiple nodes", &block.generator_public_key);
        }
        if tip_stands(&block, chain.tip()) {
            self.log.info("Last block stands");
            return Ok(BlockOutcome::LastBlockStands);
        }
        self.log.info("Last block loses");
        self.validate_recovery_candidate(&block)?;
        self.recover(chain, block, FORK_FIVE_MAX_UNDO)
    }

    /// Full validation of a fork winner, performed before the chain is touched
    fn validate_recovery_candidate(&self, block: &Block) -> BlockProcessResult<()> {
        self.block_validator
            .validate_schema(block)
            .map_err(BlockProcessError::from)
            .and_then(|_| self.slot_validator.verify_slot(block))
            .and_then(|_| self.block_validator.verify_receipt(block).map_err(BlockProcessError::from))
            .map_err(|err| self.recovery_failed(err))
    }

    /// Undoes up to `max_undo` blocks, stopping early once the tip was forged by the incoming
    /// block's generator or is genesis, and then applies the incoming block.
    ///
    /// Failing the first undo leaves the chain untouched and is reported as a recovery error. Any
    /// failure after a committed undo leaves the tip short of where consensus expects it and is fatal.
    fn recover(&self, chain: &mut ChainMutator, block: Arc<Block>, max_undo: usize) -> BlockProcessResult<BlockOutcome> {
        let mut undone = 0;
        while undone < max_undo {
            if undone > 0 && chain.tip().is_genesis() {
                break;
            }
            if let Err(err) = chain.undo() {
                if undone == 0 {
                    return Err(self.recovery_failed(err));
                }
                self.fatal(err);
            }
            undone += 1;
            if chain.tip().generator_public_key == block.generator_public_key {
                break;
            }
        }

        self.log_received(&block);
        if let Err(err) = chain.apply(block) {
            self.fatal(err);
        }
        Ok(BlockOutcome::ForkRecovered { undone })
    }

    pub fn record_fork(&self, block: &Block, cause: ForkCause) {
        let event = ForkEvent::new(cause, block);
        self.log.event(Level::Info, "Fork", &event);
        if let Err(err) = self.fork_stats_store.write().record(event) {
            self.log.warn(format_args!("Failed recording fork statistics: {}", err));
        }
    }

    fn log_received(&self, block: &Block) {
        self.log.info(format_args!(
            "Received new block id: {} height: {} round: {} slot: {} reward: {}",
            block.id,
            block.height,
            self.params.round_of(block.height),
            self.params.slot_of(block.timestamp),
            block.reward
        ));
    }

    fn recovery_failed(&self, err: BlockProcessError) -> BlockProcessError {
        self.log.event(Level::Error, "Fork recovery failed", &err.to_string());
        BlockProcessError::ForkRecovery(Box::new(err))
    }

    fn fatal(&self, err: BlockProcessError) -> ! {
        self.log.event(Level::Error, "Fork recovery failed", &err.to_string());
        panic!("fork recovery failed after rolling back the chain: {}", err);
    }
}
