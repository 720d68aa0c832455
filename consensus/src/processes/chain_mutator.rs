use crate::{
    consensus::storage::ChainStorage,
    errors::{BlockProcessError, BlockProcessResult},
    model::stores::{
        blocks::{BlockStore, BlockStoreReader},
        errors::{StoreError, StoreResult, StoreResultExtensions},
        round_snapshots::{RoundSnapshotsStore, RoundSnapshotsStoreReader},
        tip::{TipStore, TipStoreReader},
    },
};
use dpos_consensus_core::{
    api::{RoundScheduleProvider, TransactionExecutor},
    block::Block,
    config::Config,
    round::RoundSnapshot,
};
use dpos_core::log::{Level, Logger};
use std::{fmt::Display, sync::Arc};

/// Owns the chain tip and moves it one block at a time. Every `apply` and `undo` is atomic:
/// on error the chain, the round schedule and the transaction state are left as they were.
///
/// Round bookkeeping: applying a block at a round boundary snapshots the schedule state, keyed by
/// the round being entered, and then sums the finished round. Undoing that block restores the
/// snapshot and deletes it.
pub struct ChainMutator {
    config: Arc<Config>,
    storage: Arc<ChainStorage>,
    schedule: Arc<dyn RoundScheduleProvider>,
    executor: Arc<dyn TransactionExecutor>,
    tip: Arc<Block>,
    log: Logger,
}

impl ChainMutator {
    /// Loads the tip from storage, initializing an empty chain with genesis if configured to
    pub fn new(
        config: Arc<Config>,
        storage: Arc<ChainStorage>,
        schedule: Arc<dyn RoundScheduleProvider>,
        executor: Arc<dyn TransactionExecutor>,
        log: Logger,
    ) -> BlockProcessResult<Self> {
        let tip_id = storage.tip_store.read().get().optional()?;
        let tip = match tip_id {
            Some(id) => storage.block_store.read().get(&id)?,
            None if config.process_genesis => {
                let genesis = Arc::new(config.genesis.build_block());
                storage.block_store.write().insert(genesis.clone())?;
                storage.tip_store.write().set(genesis.id.clone())?;
                log.info(format_args!("Initialized chain with genesis block {}", genesis.id));
                genesis
            }
            None => return Err(StoreError::KeyNotFound("tip".to_string()).into()),
        };
        Ok(Self { config, storage, schedule, executor, tip, log })
    }

    pub fn tip(&self) -> &Arc<Block> {
        &self.tip
    }

    pub fn storage(&self) -> &Arc<ChainStorage> {
        &self.storage
    }

    /// Applies `block` on top of the tip and makes it the new tip. Linkage is not checked here.
    pub fn apply(&mut self, block: Arc<Block>) -> BlockProcessResult<()> {
        self.executor.apply_all(&block.transactions)?;
        self.log.debug(format_args!("Block applied correctly with {} transactions", block.transactions.len()));

        let entered = if self.schedule.is_round_boundary(block.height) {
            let round = self.config.round_of(block.height);
            self.log.debug("Performing round snapshot...");
            let snapshot = self.schedule.snapshot_round();
            self.log.event(Level::Debug, "Summing round", &round);
            if let Err(err) = self.schedule.summarize_round(round) {
                self.compensate_apply(&block, Some(snapshot));
                return Err(err.into());
            }
            Some((round + 1, snapshot))
        } else {
            None
        };

        if let Err(err) = self.persist_apply(&block, entered.clone()) {
            self.compensate_apply(&block, entered.map(|(_, snapshot)| snapshot));
            return Err(err.into());
        }

        self.tip = block;
        self.log.debug("Performing forward tick");
        self.sanity_check();
        Ok(())
    }

    /// Removes the tip, making the preceding stored block the new tip. Returns the removed block.
    pub fn undo(&mut self) -> BlockProcessResult<Arc<Block>> {
        let removed = self.tip.clone();
        if removed.is_genesis() {
            return Err(BlockProcessError::GenesisUndo);
        }
        let parent = self.storage.block_store.read().get_below(removed.height)?;
        let entered = if self.schedule.is_round_boundary(removed.height) {
            let round = self.config.round_of(removed.height) + 1;
            Some((round, self.storage.round_snapshots_store.read().get(round)?))
        } else {
            None
        };

        self.log.debug("Performing backward tick");
        self.log.event(Level::Warn, "Deleting last block", &removed.snapshot());
        self.executor.revert_all(&removed.transactions)?;

        let replaced = match &entered {
            Some((_, snapshot)) => {
                let current = self.schedule.snapshot_round();
                self.log.debug("Restoring mem_round snapshot...");
                self.log.debug("Restoring mem_accounts.vote snapshot...");
                if let Err(err) = self.schedule.restore_round(snapshot.clone()) {
                    self.compensate_undo(&removed, None);
                    return Err(err.into());
                }
                Some(current)
            }
            None => None,
        };

        if let Err(err) = self.persist_undo(&removed, &parent, entered.map(|(round, _)| round)) {
            self.compensate_undo(&removed, replaced);
            return Err(err.into());
        }

        self.tip = parent;
        self.sanity_check();
        Ok(removed)
    }

    fn persist_apply(&self, block: &Arc<Block>, entered: Option<(u64, RoundSnapshot)>) -> StoreResult<()> {
        let inserted = self.storage.block_store.write().insert(block.clone())?;
        let result = match entered {
            Some((round, snapshot)) => self.storage.round_snapshots_store.write().set(round, snapshot),
            None => Ok(()),
        }
        .and_then(|_| self.storage.tip_store.write().set(block.id.clone()));
        if result.is_err() && inserted {
            let deleted = self.storage.block_store.write().delete(&block.id);
            self.log_cleanup(format_args!("removing block {} after a failed apply", block.id), deleted);
        }
        result
    }

    fn persist_undo(&self, removed: &Block, parent: &Block, entered_round: Option<u64>) -> StoreResult<()> {
        let block = self.storage.block_store.write().delete(&removed.id)?;
        if let Err(err) = self.storage.tip_store.write().set(parent.id.clone()) {
            let id = block.id.clone();
            let reinserted = self.storage.block_store.write().insert(block);
            self.log_cleanup(format_args!("restoring block {} after a failed undo", id), reinserted);
            return Err(err);
        }
        if let Some(round) = entered_round {
            let deleted = self.storage.round_snapshots_store.write().delete(round);
            self.log_cleanup(format_args!("deleting snapshot of round {}", round), deleted);
        }
        Ok(())
    }

    /// Store writes on cleanup paths do not fail the operation, but a failure leaves the stores
    /// out of line with the tip
    fn log_cleanup<T>(&self, action: impl Display, result: StoreResult<T>) {
        if let Err(err) = result {
            self.log.warn(format_args!("Store cleanup failed {}: {}", action, err));
        }
    }

    /// Reverses the effects of a partially applied block
    fn compensate_apply(&self, block: &Block, previous_round: Option<RoundSnapshot>) {
        if let Some(snapshot) = previous_round
            && let Err(err) = self.schedule.restore_round(snapshot)
        {
            panic!("failed restoring round state while rolling back block {}: {}", block.id, err);
        }
        if let Err(err) = self.executor.revert_all(&block.transactions) {
            panic!("failed reverting transactions while rolling back block {}: {}", block.id, err);
        }
    }

    /// Reverses the effects of a partially undone block
    fn compensate_undo(&self, block: &Block, replaced_round: Option<RoundSnapshot>) {
        if let Some(snapshot) = replaced_round
            && let Err(err) = self.schedule.restore_round(snapshot)
        {
            panic!("failed restoring round state while recovering block {}: {}", block.id, err);
        }
        if let Err(err) = self.executor.apply_all(&block.transactions) {
            panic!("failed re-applying transactions of block {}: {}", block.id, err);
        }
    }

    fn sanity_check(&self) {
        if !self.config.enable_sanity_checks {
            return;
        }
        let stored_tip = self.storage.tip_store.read().get();
        assert_eq!(stored_tip.as_ref(), Ok(&self.tip.id), "tip store is out of sync with the chain tip");
        assert!(self.storage.block_store.read().has(&self.tip.id), "chain tip {} is not stored", self.tip.id);
        let boundary = self.config.round_of(self.tip.height) + u64::from(self.schedule.is_round_boundary(self.tip.height));
        assert!(
            self.storage.round_snapshots_store.read().rounds().iter().all(|round| *round <= boundary),
            "round snapshot kept for a round that was never entered"
        );
    }
}
