use thiserror::Error;

/// Structural violations found by the block schema check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Failed to validate block schema: Object didn't pass validation for format {0}: {1}")]
    InvalidFormat(&'static str, String),

    #[error("Failed to validate block schema: Missing required property: {0}")]
    MissingProperty(&'static str),

    #[error("Failed to validate block schema: Value {1} is less than minimum {2} for {0}")]
    BelowMinimum(&'static str, u64, u64),

    #[error("Failed to validate vote schema: Array items are not unique (indexes {0} and {1})")]
    DuplicateVotes(usize, usize),

    #[error("Failed to validate vote schema: Object didn't pass validation for format signedPublicKey: {0}")]
    InvalidVote(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to verify block signature")]
    InvalidSignature,

    #[error("Invalid payload hash")]
    InvalidPayloadHash,

    #[error("Invalid payload length")]
    InvalidPayloadLength,

    #[error("Payload length is too long")]
    PayloadTooLong,

    #[error("Included transactions do not match block transactions count")]
    TransactionCountMismatch,

    #[error("Number of transactions exceeds maximum per block")]
    TooManyTransactions,

    #[error("Encountered duplicate transaction: {0}")]
    DuplicateTransaction(String),

    #[error("Invalid total amount")]
    InvalidTotalAmount,

    #[error("Invalid total fee")]
    InvalidTotalFee,

    #[error("Invalid block timestamp")]
    InvalidTimestamp { timestamp: u64, reference: u64 },

    #[error("Block slot is in the future")]
    TimestampInFuture { timestamp: u64, chain_time: u64 },

    #[error("Invalid block version")]
    InvalidVersion(u32),

    #[error("Invalid previous block: {received} expected: {expected}")]
    InvalidPreviousBlock { received: String, expected: String },

    #[error("Unknown transaction type {0}")]
    UnknownTransactionType(u8),

    #[error("Failed to verify slot: {slot}")]
    SlotMismatch { slot: u64, expected: String, received: String },
}

impl RuleError {
    pub fn is_linkage_error(&self) -> bool {
        matches!(self, Self::InvalidPreviousBlock { .. })
    }

    pub fn is_timestamp_error(&self) -> bool {
        matches!(self, Self::InvalidTimestamp { .. } | Self::TimestampInFuture { .. })
    }
}

pub type BlockValidationResult<T> = std::result::Result<T, RuleError>;
