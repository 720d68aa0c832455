use crate::model::stores::errors::StoreError;
use dpos_consensus_core::errors::{
    block::RuleError, execution::ExecutionError, peer::PeerError, schedule::ScheduleError,
};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BlockProcessError {
    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("{0}")]
    TransactionApply(#[from] ExecutionError),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Peer(#[from] PeerError),

    /// A fork recovery was aborted before the chain was touched
    #[error("{0}")]
    ForkRecovery(Box<BlockProcessError>),

    #[error("Failed to load blocks: {0}")]
    LoadBlocks(Box<BlockProcessError>),

    #[error("Cannot undo the genesis block")]
    GenesisUndo,

    #[error("Chain comparison failed with peer: {peer} using ids: {ids}")]
    CommonBlockNotFound { peer: String, ids: String },

    #[error("Chain comparison failed with peer: {peer} using block: {block}")]
    CommonBlockMismatch { peer: String, block: String },

    #[error("Block processing sequencer is closed")]
    SequencerClosed,
}

impl BlockProcessError {
    /// The validation rule which ultimately caused this error, looking through recovery and load wrappers
    pub fn rule(&self) -> Option<&RuleError> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::ForkRecovery(inner) | Self::LoadBlocks(inner) => inner.rule(),
            _ => None,
        }
    }

    pub fn is_fork_recovery(&self) -> bool {
        matches!(self, Self::ForkRecovery(_))
    }
}

pub type BlockProcessResult<T> = std::result::Result<T, BlockProcessError>;
