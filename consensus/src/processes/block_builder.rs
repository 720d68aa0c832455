use dpos_consensus_core::{
    block::Block,
    config::params::Params,
    hashing::block::payload_digest,
    sign::sign_block,
    tx::Transaction,
};
use secp256k1::Keypair;
use std::sync::Arc;

/// Builds a block extending `parent` with the given transactions and signs it with `keypair`
pub fn build_block(params: &Params, parent: &Block, timestamp: u64, transactions: Vec<Transaction>, keypair: &Keypair) -> Block {
    let payload = payload_digest(&transactions);
    let mut block = Block {
        id: String::new(),
        version: params.block_version,
        timestamp,
        height: parent.height + 1,
        previous_block: Some(parent.id.clone()),
        number_of_transactions: transactions.len() as u32,
        total_amount: transactions.iter().fold(0u64, |acc, tx| acc.saturating_add(tx.amount)),
        total_fee: transactions.iter().fold(0u64, |acc, tx| acc.saturating_add(tx.fee)),
        reward: params.block_reward,
        payload_length: payload.length,
        payload_hash: payload.hash,
        generator_public_key: String::new(),
        block_signature: String::new(),
        transactions: Arc::new(transactions),
    };
    sign_block(&mut block, keypair);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_consensus_core::{config::params::DEVNET_PARAMS, sign::{keypair_from_secret, verify_block_signature}};

    #[test]
    fn test_build_block() {
        let params = DEVNET_PARAMS;
        let genesis = params.genesis.build_block();
        let keypair = keypair_from_secret(&[3u8; 32]).unwrap();
        let sender = dpos_consensus_core::sign::public_key_hex(&keypair);
        let txs = vec![
            Transaction::new_transfer(5, sender.clone(), "1L".into(), 10, 1),
            Transaction::new_transfer(6, sender, "2L".into(), 20, 2),
        ];
        let block = build_block(&params, &genesis, 30, txs, &keypair);

        assert_eq!(block.height, 2);
        assert_eq!(block.previous_block.as_deref(), Some(genesis.id.as_str()));
        assert_eq!(block.number_of_transactions, 2);
        assert_eq!(block.total_amount, 30);
        assert_eq!(block.total_fee, 3);
        verify_block_signature(&block).unwrap();
    }
}
