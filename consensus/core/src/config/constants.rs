pub mod consensus {
    //!
    //! Constants which directly impact consensus.
    //!

    /// Block version produced by this node
    pub const BLOCK_VERSION: u32 = 0;

    /// Block versions accepted from the network
    pub const SUPPORTED_BLOCK_VERSIONS: &[u32] = &[0];

    /// Seconds per forging slot
    pub const BLOCK_TIME: u64 = 10;

    /// Number of forging delegates, which is also the number of blocks per round
    pub const ACTIVE_DELEGATES: u64 = 101;

    /// How far ahead of local chain time (seconds) a block timestamp may be
    pub const TIMESTAMP_DEVIATION_TOLERANCE: u64 = 15;

    pub const MAX_TRANSACTIONS_PER_BLOCK: u32 = 25;

    /// Upper bound on the canonical byte length of a block payload
    pub const MAX_PAYLOAD_LENGTH: u32 = 1024 * 1024;

    /// Reward in beddows credited to the generator of each block
    pub const BLOCK_REWARD: u64 = 500_000_000;
}

pub mod perf {
    //!
    //! Non-consensus parameters governing synchronization with peers.
    //!

    /// Maximum number of blocks requested from a peer in a single batch
    pub const PEER_BLOCKS_LIMIT: usize = 34;

    /// Number of recent block ids offered to a peer when searching for a common block
    pub const COMMON_BLOCK_IDS: u64 = 5;
}
