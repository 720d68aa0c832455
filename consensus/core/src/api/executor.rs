use crate::{errors::execution::ExecutionResult, tx::Transaction};

/// Applies and reverts the transactions of a block. Both operations are all-or-nothing:
/// on error, no transaction of the batch has taken effect.
pub trait TransactionExecutor: Send + Sync {
    fn apply_all(&self, transactions: &[Transaction]) -> ExecutionResult<()>;

    /// Reverts in reverse order a batch previously applied with `apply_all`
    fn revert_all(&self, transactions: &[Transaction]) -> ExecutionResult<()>;
}
