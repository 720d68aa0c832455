use crate::{PublicKeyHex, errors::schedule::ScheduleResult, round::RoundSnapshot};

/// Delegate schedule and round bookkeeping. Implementations synchronize internally; the chain
/// mutator is the only writer.
pub trait RoundScheduleProvider: Send + Sync {
    /// The delegate entitled to forge in the slot containing `timestamp`
    fn expected_generator(&self, timestamp: u64) -> ScheduleResult<PublicKeyHex>;

    fn is_round_boundary(&self, height: u64) -> bool;

    /// Tallies the completed `round` and computes the forging order of the next one
    fn summarize_round(&self, round: u64) -> ScheduleResult<()>;

    fn snapshot_round(&self) -> RoundSnapshot;

    fn restore_round(&self, snapshot: RoundSnapshot) -> ScheduleResult<()>;
}
