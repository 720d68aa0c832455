use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Transaction {0} failed to apply: {1}")]
    ApplyFailed(String, String),

    #[error("Transaction {0} failed to revert: {1}")]
    RevertFailed(String, String),

    #[error("{0}")]
    General(String),
}

pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
