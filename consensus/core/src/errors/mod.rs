pub mod block;
pub mod execution;
pub mod peer;
pub mod schedule;
