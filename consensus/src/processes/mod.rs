pub mod block_builder;
pub mod block_validator;
pub mod chain_mutator;
pub mod fork_resolver;
pub mod slot_validator;
