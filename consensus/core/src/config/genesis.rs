use crate::{
    block::Block,
    config::constants::consensus::BLOCK_VERSION,
    hashing::block::payload_digest,
};
use std::sync::Arc;

/// The trusted first block of a network. It carries no transactions and is never validated.
#[derive(Clone, Debug)]
pub struct GenesisBlock {
    pub id: &'static str,
    pub version: u32,
    pub timestamp: u64,
    pub generator_public_key: &'static str,
    pub block_signature: &'static str,
}

impl GenesisBlock {
    pub fn build_block(&self) -> Block {
        Block {
            id: self.id.to_string(),
            version: self.version,
            timestamp: self.timestamp,
            height: 1,
            previous_block: None,
            number_of_transactions: 0,
            total_amount: 0,
            total_fee: 0,
            reward: 0,
            payload_length: 0,
            payload_hash: payload_digest(&[]).hash,
            generator_public_key: self.generator_public_key.to_string(),
            block_signature: self.block_signature.to_string(),
            transactions: Arc::new(Vec::new()),
        }
    }
}

impl From<&GenesisBlock> for Block {
    fn from(genesis: &GenesisBlock) -> Self {
        genesis.build_block()
    }
}

const ZERO_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_SIGNATURE: &str = "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000";

pub const GENESIS: GenesisBlock = GenesisBlock {
    id: "6524861224470851795",
    version: BLOCK_VERSION,
    timestamp: 0,
    generator_public_key: ZERO_KEY,
    block_signature: ZERO_SIGNATURE,
};

pub const TESTNET_GENESIS: GenesisBlock = GenesisBlock {
    id: "13782017140197363510",
    version: BLOCK_VERSION,
    timestamp: 0,
    generator_public_key: ZERO_KEY,
    block_signature: ZERO_SIGNATURE,
};

pub const DEVNET_GENESIS: GenesisBlock = GenesisBlock {
    id: "1000000000000000001",
    version: BLOCK_VERSION,
    timestamp: 0,
    generator_public_key: ZERO_KEY,
    block_signature: ZERO_SIGNATURE,
};
