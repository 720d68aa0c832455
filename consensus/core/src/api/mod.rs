//! Interfaces of the collaborators the block processing engine relies on

mod executor;
mod peer;
mod schedule;

pub use executor::TransactionExecutor;
pub use peer::PeerBlockSource;
pub use schedule::RoundScheduleProvider;
