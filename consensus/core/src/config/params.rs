pub use super::{
    constants::{consensus::*, perf::*},
    genesis::{DEVNET_GENESIS, GENESIS, GenesisBlock, TESTNET_GENESIS},
};

/// Consensus parameters. Contains slot and round arithmetic shared by all chain components.
#[derive(Clone, Debug)]
pub struct Params {
    pub network_name: &'static str,
    pub genesis: GenesisBlock,

    /// Number of forging delegates; one round consists of exactly this many blocks
    pub active_delegates: u64,

    /// Seconds per forging slot
    pub block_time: u64,

    /// Unix time in milliseconds at which chain time starts
    pub epoch_time: u64,

    pub block_version: u32,
    pub supported_block_versions: &'static [u32],

    /// Allowed drift (seconds) of a block timestamp ahead of local chain time
    pub timestamp_deviation_tolerance: u64,

    pub block_reward: u64,
    pub max_transactions_per_block: u32,
    pub max_payload_length: u32,

    pub peer_blocks_limit: usize,
    pub common_block_ids: u64,
}

impl Params {
    /// Round containing `height`, i.e. `ceil(height / active_delegates)`
    #[inline]
    pub fn round_of(&self, height: u64) -> u64 {
        height.div_ceil(self.active_delegates)
    }

    /// Whether `height` is the last block of its round
    #[inline]
    pub fn is_round_boundary(&self, height: u64) -> bool {
        height % self.active_delegates == 0
    }

    #[inline]
    pub fn slot_of(&self, timestamp: u64) -> u64 {
        timestamp / self.block_time
    }

    #[inline]
    pub fn slot_time(&self, slot: u64) -> u64 {
        slot * self.block_time
    }

    /// Converts unix time in milliseconds into chain time in seconds
    pub fn chain_time(&self, unix_millis: u64) -> u64 {
        unix_millis.saturating_sub(self.epoch_time) / 1000
    }

    pub fn is_supported_version(&self, version: u32) -> bool {
        self.supported_block_versions.contains(&version)
    }
}

pub const MAINNET_PARAMS: Params = Params {
    network_name: "mainnet",
    genesis: GENESIS,
    active_delegates: ACTIVE_DELEGATES,
    block_time: BLOCK_TIME,
    // 2016-05-24 17:00:00 UTC
    epoch_time: 1_464_109_200_000,
    block_version: BLOCK_VERSION,
    supported_block_versions: SUPPORTED_BLOCK_VERSIONS,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    block_reward: BLOCK_REWARD,
    max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
    max_payload_length: MAX_PAYLOAD_LENGTH,
    peer_blocks_limit: PEER_BLOCKS_LIMIT,
    common_block_ids: COMMON_BLOCK_IDS,
};

pub const TESTNET_PARAMS: Params = Params {
    network_name: "testnet",
    genesis: TESTNET_GENESIS,
    active_delegates: ACTIVE_DELEGATES,
    block_time: BLOCK_TIME,
    epoch_time: 1_464_109_200_000,
    block_version: BLOCK_VERSION,
    supported_block_versions: SUPPORTED_BLOCK_VERSIONS,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    block_reward: BLOCK_REWARD,
    max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
    max_payload_length: MAX_PAYLOAD_LENGTH,
    peer_blocks_limit: PEER_BLOCKS_LIMIT,
    common_block_ids: COMMON_BLOCK_IDS,
};

/// Small local network used by tests and the simulator
pub const DEVNET_PARAMS: Params = Params {
    network_name: "devnet",
    genesis: DEVNET_GENESIS,
    active_delegates: 11,
    block_time: BLOCK_TIME,
    // 2020-01-01 00:00:00 UTC
    epoch_time: 1_577_836_800_000,
    block_version: BLOCK_VERSION,
    supported_block_versions: SUPPORTED_BLOCK_VERSIONS,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    block_reward: 0,
    max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
    max_payload_length: MAX_PAYLOAD_LENGTH,
    peer_blocks_limit: PEER_BLOCKS_LIMIT,
    common_block_ids: COMMON_BLOCK_IDS,
};
