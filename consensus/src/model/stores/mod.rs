pub mod blocks;
pub mod errors;
pub mod fork_stats;
pub mod round_snapshots;
pub mod tip;
