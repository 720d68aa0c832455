use dpos_consensus_core::{
    block::Block,
    config::params::Params,
    errors::block::{BlockValidationResult, RuleError, SchemaError},
    hashing::{block::payload_digest, is_hex_of_len},
    sign::verify_block_signature,
    tx::{Transaction, TransactionType},
};
use dpos_core::time::unix_now;
use std::collections::HashSet;

const MAX_ID_LENGTH: usize = 20;

/// Stateless structural and cryptographic block checks. Each `check_*`/`verify_*` method fails
/// independently; the pipeline methods run them in a fixed order and stop at the first failure.
#[derive(Clone)]
pub struct BlockValidator {
    params: Params,
}

impl BlockValidator {
    pub fn new(params: &Params) -> Self {
        Self { params: params.clone() }
    }

    /// Checks performed on any block regardless of chain context: schema, known transaction
    /// types, signature, version and payload
    pub fn validate_in_isolation(&self, block: &Block) -> BlockValidationResult<()> {
        self.validate_schema(block)?;
        self.verify_receipt(block)
    }

    /// The in-isolation checks minus the schema
    pub fn verify_receipt(&self, block: &Block) -> BlockValidationResult<()> {
        self.verify_known_transaction_types(block)?;
        self.verify_signature(block)?;
        self.verify_version(block)?;
        self.verify_payload(block)
    }

    /// Pipeline for a block received live as a direct extension of `tip`
    pub fn validate_live(&self, block: &Block, tip: &Block) -> BlockValidationResult<()> {
        self.validate_in_isolation(block)?;
        self.verify_timestamp(block, tip)
    }

    /// Pipeline for a block replayed on top of `previous`, with explicit linkage
    pub fn validate_replay(&self, block: &Block, previous: &Block) -> BlockValidationResult<()> {
        self.validate_schema(block)?;
        self.verify_known_transaction_types(block)?;
        self.verify_signature(block)?;
        self.verify_previous_block(block, previous)?;
        self.verify_version(block)?;
        self.verify_payload(block)?;
        self.verify_timestamp(block, previous)
    }

    /// Lightweight check for trusted replay
    pub fn validate_trusted(&self, block: &Block) -> BlockValidationResult<()> {
        self.verify_known_transaction_types(block)
    }

    pub fn validate_schema(&self, block: &Block) -> BlockValidationResult<()> {
        check_id("id", &block.id)?;
        if block.height < 1 {
            return Err(SchemaError::BelowMinimum("height", block.height, 1).into());
        }
        match &block.previous_block {
            Some(previous) => check_id("id", previous)?,
            None if block.height > 1 => return Err(SchemaError::MissingProperty("previousBlock").into()),
            None => {}
        }
        if !is_hex_of_len(&block.generator_public_key, 32) {
            return Err(SchemaError::InvalidFormat("publicKey", block.generator_public_key.clone()).into());
        }
        if !is_hex_of_len(&block.block_signature, 64) {
            return Err(SchemaError::InvalidFormat("signature", block.block_signature.clone()).into());
        }
        if !is_hex_of_len(&block.payload_hash, 32) {
            return Err(SchemaError::InvalidFormat("hex", block.payload_hash.clone()).into());
        }
        for tx in block.transactions.iter() {
            check_votes(tx)?;
        }
        Ok(())
    }

    pub fn verify_signature(&self, block: &Block) -> BlockValidationResult<()> {
        verify_block_signature(block).map_err(|_| RuleError::InvalidSignature)
    }

    pub fn verify_payload(&self, block: &Block) -> BlockValidationResult<()> {
        if block.payload_length > self.params.max_payload_length {
            return Err(RuleError::PayloadTooLong);
        }
        if block.transactions.len() != block.number_of_transactions as usize {
            return Err(RuleError::TransactionCountMismatch);
        }
        if block.transactions.len() > self.params.max_transactions_per_block as usize {
            return Err(RuleError::TooManyTransactions);
        }

        let mut ids = HashSet::with_capacity(block.transactions.len());
        let (mut total_amount, mut total_fee) = (0u64, 0u64);
        for tx in block.transactions.iter() {
            if !ids.insert(tx.id.as_str()) {
                return Err(RuleError::DuplicateTransaction(tx.id.clone()));
            }
            total_amount = total_amount.saturating_add(tx.amount);
            total_fee = total_fee.saturating_add(tx.fee);
        }

        let payload = payload_digest(&block.transactions);
        if payload.hash != block.payload_hash {
            return Err(RuleError::InvalidPayloadHash);
        }
        if total_amount != block.total_amount {
            return Err(RuleError::InvalidTotalAmount);
        }
        if total_fee != block.total_fee {
            return Err(RuleError::InvalidTotalFee);
        }
        if payload.length != block.payload_length {
            return Err(RuleError::InvalidPayloadLength);
        }
        Ok(())
    }

    /// Requires the block to be strictly later than `reference` and not beyond the allowed drift
    /// ahead of local chain time
    pub fn verify_timestamp(&self, block: &Block, reference: &Block) -> BlockValidationResult<()> {
        if block.timestamp <= reference.timestamp {
            return Err(RuleError::InvalidTimestamp { timestamp: block.timestamp, reference: reference.timestamp });
        }
        let chain_time = self.params.chain_time(unix_now());
        if block.timestamp > chain_time + self.params.timestamp_deviation_tolerance {
            return Err(RuleError::TimestampInFuture { timestamp: block.timestamp, chain_time });
        }
        Ok(())
    }

    pub fn verify_version(&self, block: &Block) -> BlockValidationResult<()> {
        if block.version > self.params.block_version || !self.params.is_supported_version(block.version) {
            return Err(RuleError::InvalidVersion(block.version));
        }
        Ok(())
    }

    pub fn verify_previous_block(&self, block: &Block, expected: &Block) -> BlockValidationResult<()> {
        if block.previous_block.as_deref() != Some(expected.id.as_str()) {
            return Err(RuleError::InvalidPreviousBlock {
                received: block.previous_block.clone().unwrap_or_else(|| "null".to_string()),
                expected: expected.id.clone(),
            });
        }
        Ok(())
    }

    pub fn verify_known_transaction_types(&self, block: &Block) -> BlockValidationResult<()> {
        match block.transactions.iter().find(|tx| tx.kind().is_none()) {
            Some(tx) => Err(RuleError::UnknownTransactionType(tx.tx_type)),
            None => Ok(()),
        }
    }
}

/// Format check of a block id token
pub fn check_id(field: &'static str, id: &str) -> BlockValidationResult<()> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SchemaError::InvalidFormat(field, id.to_string()).into());
    }
    Ok(())
}

fn check_votes(tx: &Transaction) -> BlockValidationResult<()> {
    if tx.kind() != Some(TransactionType::Vote) {
        return Ok(());
    }
    let votes = tx.votes();
    for (i, vote) in votes.iter().enumerate() {
        if let Some(j) = votes[i + 1..].iter().position(|other| other == vote) {
            return Err(SchemaError::DuplicateVotes(i, i + 1 + j).into());
        }
    }
    for vote in votes {
        let key = vote.strip_prefix('+').or_else(|| vote.strip_prefix('-'));
        if !key.is_some_and(|key| is_hex_of_len(key, 32)) {
            return Err(SchemaError::InvalidVote(vote.clone()).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::block_builder::build_block;
    use dpos_consensus_core::{
        config::params::DEVNET_PARAMS,
        sign::{keypair_from_secret, public_key_hex, sign_block},
    };
    use secp256k1::Keypair;

    struct Fixture {
        params: Params,
        validator: BlockValidator,
        keypair: Keypair,
        genesis: Block,
    }

    impl Fixture {
        fn new() -> Self {
            let params = DEVNET_PARAMS;
            Self {
                validator: BlockValidator::new(&params),
                keypair: keypair_from_secret(&[9u8; 32]).unwrap(),
                genesis: params.genesis.build_block(),
                params,
            }
        }

        fn block(&self, transactions: Vec<Transaction>) -> Block {
            build_block(&self.params, &self.genesis, 10, transactions, &self.keypair)
        }

        /// Applies `edit` and signs the block again so that only the edited property is invalid
        fn edited(&self, edit: impl FnOnce(&mut Block)) -> Block {
            let mut block = self.block(vec![]);
            edit(&mut block);
            sign_block(&mut block, &self.keypair);
            block
        }

        fn vote(&self, votes: Vec<String>) -> Transaction {
            Transaction::new_vote(5, public_key_hex(&self.keypair), votes, 1)
        }
    }

    #[test]
    fn test_valid_block_passes_all_pipelines() {
        let f = Fixture::new();
        let block = f.block(vec![f.vote(vec![format!("+{}", "ab".repeat(32))])]);
        f.validator.validate_live(&block, &f.genesis).unwrap();
        f.validator.validate_replay(&block, &f.genesis).unwrap();
        f.validator.validate_trusted(&block).unwrap();
    }

    #[test]
    fn test_schema_errors() {
        let f = Fixture::new();

        let mut block = f.block(vec![]);
        block.block_signature = "x".repeat(128);
        let err = f.validator.validate_schema(&block).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Failed to validate block schema: Object didn't pass validation for format signature: {}", "x".repeat(128))
        );

        let mut block = f.block(vec![]);
        block.previous_block = None;
        assert_eq!(f.validator.validate_schema(&block), Err(SchemaError::MissingProperty("previousBlock").into()));

        let mut block = f.block(vec![]);
        block.id = "12a".into();
        assert_eq!(f.validator.validate_schema(&block), Err(SchemaError::InvalidFormat("id", "12a".into()).into()));

        let mut block = f.block(vec![]);
        block.generator_public_key = "ab".into();
        assert!(matches!(
            f.validator.validate_schema(&block),
            Err(RuleError::Schema(SchemaError::InvalidFormat("publicKey", _)))
        ));
    }

    #[test]
    fn test_duplicate_votes() {
        let f = Fixture::new();
        let keys: Vec<String> = (1..=4u8).map(|i| format!("+{}", hex(i))).collect();
        let mut votes = keys.clone();
        votes.push(keys[0].clone());
        let block = f.block(vec![f.vote(votes)]);
        let err = f.validator.validate_in_isolation(&block).unwrap_err();
        assert_eq!(err.to_string(), "Failed to validate vote schema: Array items are not unique (indexes 0 and 4)");

        let block = f.block(vec![f.vote(vec!["*".to_string()])]);
        assert_eq!(f.validator.validate_schema(&block), Err(SchemaError::InvalidVote("*".into()).into()));
    }

    #[test]
    fn test_signature() {
        let f = Fixture::new();
        let mut block = f.block(vec![]);
        block.timestamp += 1;
        assert_eq!(f.validator.validate_in_isolation(&block), Err(RuleError::InvalidSignature));
    }

    #[test]
    fn test_payload() {
        let f = Fixture::new();
        let sender = public_key_hex(&f.keypair);
        let tx = Transaction::new_transfer(1, sender, "1L".into(), 100, 10);

        let block = f.edited(|b| b.payload_hash = "00".repeat(32));
        assert_eq!(f.validator.validate_in_isolation(&block), Err(RuleError::InvalidPayloadHash));

        let mut block = f.block(vec![tx.clone()]);
        block.total_amount = 1;
        sign_block(&mut block, &f.keypair);
        assert_eq!(f.validator.verify_payload(&block), Err(RuleError::InvalidTotalAmount));

        let mut block = f.block(vec![tx.clone(), tx.clone()]);
        sign_block(&mut block, &f.keypair);
        assert_eq!(f.validator.verify_payload(&block), Err(RuleError::DuplicateTransaction(tx.id.clone())));

        let block = f.edited(|b| b.number_of_transactions = 3);
        assert_eq!(f.validator.verify_payload(&block), Err(RuleError::TransactionCountMismatch));
    }

    #[test]
    fn test_timestamp() {
        let f = Fixture::new();
        let block = f.block(vec![]);
        let mut tip = f.genesis.clone();
        tip.timestamp = block.timestamp;
        assert_eq!(
            f.validator.validate_live(&block, &tip),
            Err(RuleError::InvalidTimestamp { timestamp: block.timestamp, reference: block.timestamp })
        );
        assert_eq!(f.validator.validate_live(&block, &tip).unwrap_err().to_string(), "Invalid block timestamp");

        let future = f.edited(|b| b.timestamp = u32::MAX as u64 * 100);
        assert!(f.validator.validate_live(&future, &f.genesis).unwrap_err().is_timestamp_error());
    }

    #[test]
    fn test_version() {
        let f = Fixture::new();
        let block = f.edited(|b| b.version = 1);
        assert_eq!(f.validator.validate_in_isolation(&block), Err(RuleError::InvalidVersion(1)));
        assert_eq!(RuleError::InvalidVersion(1).to_string(), "Invalid block version");

        let upgraded = Params { block_version: 1, supported_block_versions: &[0, 1], ..DEVNET_PARAMS };
        let validator = BlockValidator::new(&upgraded);
        validator.verify_version(&block).unwrap();
        assert_eq!(validator.verify_version(&f.edited(|b| b.version = 2)), Err(RuleError::InvalidVersion(2)));
    }

    #[test]
    fn test_timestamp_tolerance_follows_chain_time() {
        let f = Fixture::new();
        let chain_time = f.params.chain_time(unix_now());
        let current = f.edited(|b| b.timestamp = chain_time);
        f.validator.verify_timestamp(&current, &f.genesis).unwrap();

        let ahead = chain_time + f.params.timestamp_deviation_tolerance + 100;
        let future = f.edited(|b| b.timestamp = ahead);
        assert!(matches!(
            f.validator.verify_timestamp(&future, &f.genesis),
            Err(RuleError::TimestampInFuture { timestamp, .. }) if timestamp == ahead
        ));
    }

    #[test]
    fn test_previous_block() {
        let f = Fixture::new();
        let block = f.edited(|b| b.previous_block = Some("123".into()));
        // linkage is not part of the live pipeline
        f.validator.validate_live(&block, &f.genesis).unwrap();
        let err = f.validator.validate_replay(&block, &f.genesis).unwrap_err();
        assert!(err.is_linkage_error());
        assert_eq!(err.to_string(), format!("Invalid previous block: 123 expected: {}", f.genesis.id));
    }

    #[test]
    fn test_unknown_transaction_type() {
        let f = Fixture::new();
        let mut tx = Transaction::new_transfer(1, public_key_hex(&f.keypair), "1L".into(), 1, 1);
        tx.tx_type = 99;
        tx.finalize();
        let block = f.block(vec![tx]);
        assert_eq!(f.validator.validate_trusted(&block), Err(RuleError::UnknownTransactionType(99)));
        assert_eq!(f.validator.validate_live(&block, &f.genesis), Err(RuleError::UnknownTransactionType(99)));
    }

    fn hex(seed: u8) -> String {
        format!("{:02x}", seed).repeat(32)
    }
}
