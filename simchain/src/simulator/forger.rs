use dpos_consensus::{
    errors::{BlockProcessError, BlockProcessResult},
    processes::fork_resolver::BlockOutcome,
    testutils::ChainGenerator,
};
use dpos_consensus_core::{block::Block, errors::block::RuleError, tx::Transaction};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Competing traffic delivered to the follower around an honest block
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Injection {
    /// Forged by a delegate not scheduled for the slot, sent before the honest block
    WrongGenerator,
    /// Forged for the following slot on the same parent, sent before the honest block
    EarlySibling,
    /// Forged for the following slot on the same parent, sent after the honest block
    LateSibling,
    /// A successor of an unseen sibling, sent after the honest block
    DivergentSuccessor,
    /// The honest block sent a second time
    Duplicate,
}

impl Injection {
    const ALL: [Injection; 5] =
        [Self::WrongGenerator, Self::EarlySibling, Self::LateSibling, Self::DivergentSuccessor, Self::Duplicate];

    /// Whether the competing block is delivered before the honest one
    pub fn precedes_honest_block(self) -> bool {
        matches!(self, Self::WrongGenerator | Self::EarlySibling)
    }

    /// Outcome the follower is expected to report for the competing block
    pub fn is_expected(self, result: &BlockProcessResult<BlockOutcome>) -> bool {
        match self {
            Self::WrongGenerator => matches!(result, Err(BlockProcessError::Rule(RuleError::SlotMismatch { .. }))),
            Self::EarlySibling => matches!(result, Ok(BlockOutcome::Accepted)),
            Self::LateSibling | Self::DivergentSuccessor => matches!(result, Ok(BlockOutcome::LastBlockStands)),
            Self::Duplicate => matches!(result, Ok(BlockOutcome::AlreadyProcessed)),
        }
    }
}

/// Picks transactions and competing blocks for each forged slot
pub struct Forger {
    rng: ChaCha8Rng,
    fork_rate: f64,
    vote_rate: f64,
    tpb: usize,
}

impl Forger {
    pub fn new(rng: ChaCha8Rng, fork_rate: f64, vote_rate: f64, tpb: usize) -> Self {
        Self { rng, fork_rate, vote_rate, tpb }
    }

    /// Transfers for the next block, with an occasional vote reshuffling the delegate ranking
    pub fn transactions(&mut self, generator: &ChainGenerator, delegates: &[String]) -> Vec<Transaction> {
        let count = self.rng.gen_range(0..=self.tpb);
        let mut transactions: Vec<Transaction> = (0..count).map(|_| generator.transfer(self.rng.gen_range(1..1_000_000))).collect();
        if !delegates.is_empty() && self.rng.gen_bool(self.vote_rate) {
            let delegate = &delegates[self.rng.gen_range(0..delegates.len())];
            transactions.push(generator.vote(vec![format!("+{}", delegate)]));
        }
        transactions
    }

    pub fn injection(&mut self) -> Option<Injection> {
        if !self.rng.gen_bool(self.fork_rate) {
            return None;
        }
        Some(Injection::ALL[self.rng.gen_range(0..Injection::ALL.len())])
    }

    /// Builds the competing block for the honest block at `slot` on top of `parent`. Must be called
    /// while the producer's schedule still reflects `parent`. Duplicates reuse the honest block.
    pub fn competing_block(&self, injection: Injection, generator: &ChainGenerator, parent: &Block, slot: u64) -> Option<Block> {
        match injection {
            Injection::WrongGenerator => Some(generator.block_by_other(parent, slot)),
            Injection::EarlySibling | Injection::LateSibling => Some(generator.block_at_slot(parent, slot + 1, vec![])),
            Injection::DivergentSuccessor => {
                let sibling = generator.block_at_slot(parent, slot + 1, vec![]);
                Some(generator.block_at_slot(&sibling, slot + 2, vec![]))
            }
            Injection::Duplicate => None,
        }
    }
}
