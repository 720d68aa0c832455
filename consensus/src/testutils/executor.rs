use super::MemoryRoundSchedule;
use dpos_consensus_core::{
    api::TransactionExecutor,
    errors::execution::{ExecutionError, ExecutionResult},
    tx::{Transaction, TransactionType},
};
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc};

#[derive(Default)]
struct ExecutorState {
    applied: Vec<String>,
    failing: HashSet<String>,
}

/// Tracks applied transaction ids as a stack. When linked to a schedule, each `+key` vote adds one
/// unit of weight to the delegate and each `-key` vote removes one.
#[derive(Default)]
pub struct MemoryTransactionExecutor {
    state: Mutex<ExecutorState>,
    schedule: Option<Arc<MemoryRoundSchedule>>,
}

impl MemoryTransactionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(schedule: Arc<MemoryRoundSchedule>) -> Self {
        Self { schedule: Some(schedule), ..Default::default() }
    }

    /// Ids of all applied transactions, oldest first
    pub fn applied(&self) -> Vec<String> {
        self.state.lock().applied.clone()
    }

    /// Makes any batch containing `id` fail to apply
    pub fn fail_transaction(&self, id: &str) {
        self.state.lock().failing.insert(id.to_string());
    }

    fn count_votes(&self, transactions: &[Transaction], sign: i64) {
        let Some(schedule) = &self.schedule else { return };
        for tx in transactions.iter().filter(|tx| tx.kind() == Some(TransactionType::Vote)) {
            for vote in tx.votes() {
                match vote.split_at_checked(1) {
                    Some(("+", key)) => schedule.add_votes(key, sign),
                    Some(("-", key)) => schedule.add_votes(key, -sign),
                    _ => {}
                }
            }
        }
    }
}

impl TransactionExecutor for MemoryTransactionExecutor {
    fn apply_all(&self, transactions: &[Transaction]) -> ExecutionResult<()> {
        let mut state = self.state.lock();
        if let Some(tx) = transactions.iter().find(|tx| state.failing.contains(&tx.id)) {
            return Err(ExecutionError::ApplyFailed(tx.id.clone(), "rejected by executor".to_string()));
        }
        state.applied.extend(transactions.iter().map(|tx| tx.id.clone()));
        self.count_votes(transactions, 1);
        Ok(())
    }

    fn revert_all(&self, transactions: &[Transaction]) -> ExecutionResult<()> {
        let mut state = self.state.lock();
        let start = state.applied.len().checked_sub(transactions.len());
        let is_last_batch =
            start.is_some_and(|start| state.applied[start..].iter().zip(transactions).all(|(applied, tx)| *applied == tx.id));
        match (start, is_last_batch) {
            (Some(start), true) => {
                state.applied.truncate(start);
                self.count_votes(transactions, -1);
                Ok(())
            }
            _ => {
                let id = transactions.last().map(|tx| tx.id.clone()).unwrap_or_default();
                Err(ExecutionError::RevertFailed(id, "not the most recently applied batch".to_string()))
            }
        }
    }
}
