//! In-memory collaborators and block factories for tests and the simulator

mod executor;
mod generator;
mod peer;
mod schedule;

pub use executor::MemoryTransactionExecutor;
pub use generator::ChainGenerator;
pub use peer::MemoryPeer;
pub use schedule::MemoryRoundSchedule;
