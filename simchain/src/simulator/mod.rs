pub mod forger;
pub mod network;
pub mod node;
