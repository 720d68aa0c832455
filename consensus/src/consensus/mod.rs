pub mod services;
pub mod storage;
pub mod test_consensus;

use crate::{
    errors::{BlockProcessError, BlockProcessResult},
    model::stores::{
        blocks::BlockStoreReader,
        errors::StoreResultExtensions,
        fork_stats::ForkStatsStoreReader,
        tip::TipStoreReader,
    },
    pipeline::{ProcessingCounters, sequencer::Sequencer},
    processes::{block_builder::build_block, chain_mutator::ChainMutator, fork_resolver::BlockOutcome},
};
use dpos_consensus_core::{
    BlockId,
    api::{PeerBlockSource, RoundScheduleProvider, TransactionExecutor},
    block::{Block, BlockSnapshot},
    config::Config,
    errors::block::RuleError,
    fork::{ForkCause, ForkEvent},
    tx::Transaction,
};
use dpos_core::{
    log::{Level, Logger},
    time::Stopwatch,
};
use futures_util::future::BoxFuture;
use secp256k1::Keypair;
use services::ChainServices;
use std::{
    sync::{Arc, atomic::Ordering},
    thread::JoinHandle,
};
use storage::ChainStorage;

/// Outcome of a batch load. `last_block` is the tip after the last successfully applied block and
/// `error` the failure which stopped the batch, if any.
#[derive(Debug)]
pub struct LoadedBlocks {
    pub last_block: Arc<Block>,
    pub error: Option<BlockProcessError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadMode {
    /// Known transaction types only
    Trusted,
    /// Full validation with explicit linkage to the tip
    Replay,
    /// Replay validation plus the slot check
    Peer,
}

/// Entry point of block processing. Every operation which may move the tip is queued on a single
/// sequencer, so operations take effect one at a time and in submission order.
pub struct BlockProcessor {
    config: Arc<Config>,
    storage: Arc<ChainStorage>,
    services: Arc<ChainServices>,
    sequencer: Sequencer<ChainMutator>,
    counters: Arc<ProcessingCounters>,
    log: Logger,
}

impl BlockProcessor {
    pub fn new(
        config: Arc<Config>,
        storage: Arc<ChainStorage>,
        schedule: Arc<dyn RoundScheduleProvider>,
        executor: Arc<dyn TransactionExecutor>,
        log: Logger,
    ) -> BlockProcessResult<Self> {
        let services = Arc::new(ChainServices::new(&config, schedule.clone(), storage.fork_stats_store.clone(), &log));
        let chain = ChainMutator::new(config.clone(), storage.clone(), schedule, executor, log.clone())?;
        let counters = Arc::new(ProcessingCounters::default());
        let sequencer = Sequencer::new(chain, counters.clone());
        Ok(Self { config, storage, services, sequencer, counters, log })
    }

    pub fn run_processors(&self) -> Vec<JoinHandle<()>> {
        vec![self.sequencer.init()]
    }

    pub fn signal_exit(&self) {
        self.sequencer.signal_exit();
    }

    pub fn shutdown(&self, wait_handles: Vec<JoinHandle<()>>) {
        self.signal_exit();
        // Wait for async block processing to exit
        for handle in wait_handles {
            if handle.join().is_err() {
                self.log.error("Block processing worker exited with a panic");
            }
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn storage(&self) -> &Arc<ChainStorage> {
        &self.storage
    }

    pub fn services(&self) -> &Arc<ChainServices> {
        &self.services
    }

    pub fn processing_counters(&self) -> &Arc<ProcessingCounters> {
        &self.counters
    }

    /// The current tip, as persisted by the last completed operation
    pub fn last_block(&self) -> BlockProcessResult<Arc<Block>> {
        let id = self.storage.tip_store.read().get()?;
        Ok(self.storage.block_store.read().get(&id)?)
    }

    pub fn fork_stats(&self) -> Vec<ForkEvent> {
        self.storage.fork_stats_store.read().all()
    }

    /// Queues a received block for classification against the tip and dispatch
    pub fn on_receive_block(&self, block: Block) -> BoxFuture<'static, BlockProcessResult<BlockOutcome>> {
        let services = self.services.clone();
        let counters = self.counters.clone();
        let block = Arc::new(block);
        self.sequencer.submit(move |chain| {
            let outcome = services.fork_resolver.process_block(chain, block)?;
            if matches!(outcome, BlockOutcome::Accepted | BlockOutcome::ForkRecovered { .. }) {
                counters.blocks_applied.fetch_add(1, Ordering::SeqCst);
            }
            Ok(outcome)
        })
    }

    /// Replays stored blocks with heights in `[offset, offset + limit)` on top of the tip. With
    /// `verify` set every block goes through full validation including linkage, otherwise only
    /// transaction types are checked. Stops at the first failure.
    pub fn load_blocks_offset(&self, offset: u64, limit: u64, verify: bool) -> BoxFuture<'static, BlockProcessResult<LoadedBlocks>> {
        let services = self.services.clone();
        let counters = self.counters.clone();
        let log = self.log.clone();
        let mode = if verify { LoadMode::Replay } else { LoadMode::Trusted };
        self.sequencer.submit(move |chain| {
            let _swo = Stopwatch::<1000>::with_threshold("load_blocks_offset op");
            let blocks = chain.storage().block_store.read().range(offset, limit);
            log.info(format_args!("Loading {} blocks from offset {}, limit: {}, verify: {}", blocks.len(), offset, limit, verify));
            Ok(load_blocks(&services, chain, blocks, mode, &counters, &log))
        })
    }

    /// Fetches the blocks following the tip from `peer` and applies them in order, stopping at the
    /// first failure
    pub async fn load_blocks_from_peer(&self, peer: &dyn PeerBlockSource) -> BlockProcessResult<LoadedBlocks> {
        let last_block = self.last_block()?;
        let blocks = peer.blocks_after(&last_block.id, self.config.peer_blocks_limit).await?;
        self.log.info(format_args!("Loading {} blocks from peer {}", blocks.len(), peer.address()));

        let services = self.services.clone();
        let counters = self.counters.clone();
        let log = self.log.clone();
        let blocks: Vec<Arc<Block>> = blocks.into_iter().map(Arc::new).collect();
        self.sequencer.submit(move |chain| Ok(load_blocks(&services, chain, blocks, LoadMode::Peer, &counters, &log))).await
    }

    /// Builds a block on top of the current tip, signed by `keypair`, and processes it as a
    /// direct extension
    pub fn generate_block(
        &self,
        keypair: &Keypair,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> BoxFuture<'static, BlockProcessResult<Arc<Block>>> {
        let services = self.services.clone();
        let counters = self.counters.clone();
        let config = self.config.clone();
        let keypair = *keypair;
        self.sequencer.submit(move |chain| {
            let block = Arc::new(build_block(&config, chain.tip(), timestamp, transactions, &keypair));
            services.fork_resolver.receive_block(chain, block.clone())?;
            counters.blocks_applied.fetch_add(1, Ordering::SeqCst);
            Ok(block)
        })
    }

    /// Ids of the local blocks at and below `height`, highest first, ending with genesis
    pub fn id_sequence(&self, height: u64) -> Vec<BlockId> {
        let store = self.storage.block_store.read();
        let lowest = height.saturating_sub(self.config.common_block_ids.saturating_sub(1)).max(1);
        let mut ids: Vec<BlockId> = if height >= lowest {
            store.range(lowest, height - lowest + 1).iter().rev().map(|b| b.id.clone()).collect()
        } else {
            vec![]
        };
        if !ids.iter().any(|id| *id == self.config.genesis.id) {
            ids.push(self.config.genesis.id.to_string());
        }
        ids
    }

    /// Asks `peer` for the highest block shared with the local chain at or below `height`, and
    /// confirms the answer against local storage. Does not go through the sequencer.
    pub async fn get_common_block(&self, peer: &dyn PeerBlockSource, height: u64) -> BlockProcessResult<BlockSnapshot> {
        let ids = self.id_sequence(height);
        let common = peer.common_block(&ids).await?;
        let Some(common) = common else {
            let err = BlockProcessError::CommonBlockNotFound { peer: peer.address(), ids: ids.join(",") };
            self.log.error(&err);
            return Err(err);
        };

        let local = self.storage.block_store.read().get(&common.id).optional()?;
        match local {
            Some(local) if local.height == common.height && local.previous_block == common.previous_block => Ok(common),
            _ => {
                let err = BlockProcessError::CommonBlockMismatch { peer: peer.address(), block: common.id };
                self.log.error(&err);
                Err(err)
            }
        }
    }
}

fn load_blocks(
    services: &ChainServices,
    chain: &mut ChainMutator,
    blocks: Vec<Arc<Block>>,
    mode: LoadMode,
    counters: &ProcessingCounters,
    log: &Logger,
) -> LoadedBlocks {
    let mut error = None;
    for block in blocks {
        if block.id == chain.tip().id {
            continue;
        }
        let result = validate_loaded(services, chain.tip(), &block, mode).and_then(|_| chain.apply(block.clone()));
        if let Err(err) = result {
            log.event(Level::Error, format_args!("Block {} verification failed", block.id), &err.to_string());
            error = Some(err);
            break;
        }
        counters.blocks_applied.fetch_add(1, Ordering::SeqCst);
    }
    LoadedBlocks { last_block: chain.tip().clone(), error }
}

fn validate_loaded(services: &ChainServices, tip: &Block, block: &Block, mode: LoadMode) -> BlockProcessResult<()> {
    let validator = &services.block_validator;
    let result = match mode {
        LoadMode::Trusted => validator.validate_trusted(block).map_err(BlockProcessError::from),
        LoadMode::Replay => validator.validate_replay(block, tip).map_err(BlockProcessError::from),
        LoadMode::Peer => validator
            .validate_replay(block, tip)
            .map_err(BlockProcessError::from)
            .and_then(|_| services.slot_validator.verify_slot(block)),
    };
    result.map_err(|err| match err {
        BlockProcessError::Rule(rule @ RuleError::UnknownTransactionType(_)) => BlockProcessError::LoadBlocks(Box::new(rule.into())),
        BlockProcessError::Rule(rule) if rule.is_linkage_error() => {
            services.fork_resolver.record_fork(block, ForkCause::DivergentSuccessor);
            BlockProcessError::Rule(rule)
        }
        err => err,
    })
}
