use super::MemoryRoundSchedule;
use crate::processes::block_builder::build_block;
use dpos_consensus_core::{
    PublicKeyHex,
    api::RoundScheduleProvider,
    block::Block,
    config::params::Params,
    sign::{keypair_from_secret, public_key_hex, sign_block},
    tx::Transaction,
};
use secp256k1::Keypair;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Forges correctly scheduled and signed blocks on top of arbitrary parents
pub struct ChainGenerator {
    params: Params,
    schedule: Arc<MemoryRoundSchedule>,
    keypairs: BTreeMap<PublicKeyHex, Keypair>,
    tx_nonce: AtomicU64,
}

impl ChainGenerator {
    /// Deterministic delegate keys, the i-th built from the secret `[i + 1; 32]`
    pub fn delegate_keypairs(count: usize) -> Vec<Keypair> {
        assert!(count < u8::MAX as usize, "too many delegates");
        (0..count).map(|i| keypair_from_secret(&[i as u8 + 1; 32]).expect("non-zero secrets are valid")).collect()
    }

    pub fn new(params: &Params, schedule: Arc<MemoryRoundSchedule>, keypairs: Vec<Keypair>) -> Self {
        let keypairs = keypairs.into_iter().map(|kp| (public_key_hex(&kp), kp)).collect();
        Self { params: params.clone(), schedule, keypairs, tx_nonce: AtomicU64::new(1) }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn keypair(&self, public_key: &str) -> Option<&Keypair> {
        self.keypairs.get(public_key)
    }

    /// Key pair of the delegate currently scheduled for `slot`
    pub fn scheduled_keypair(&self, slot: u64) -> &Keypair {
        let generator = self.schedule.expected_generator(self.params.slot_time(slot)).expect("schedule has delegates");
        self.keypair(&generator).expect("scheduled delegate is known to the generator")
    }

    /// Key pair of some delegate which is not scheduled for `slot`
    pub fn unscheduled_keypair(&self, slot: u64) -> &Keypair {
        let scheduled = public_key_hex(self.scheduled_keypair(slot));
        self.keypairs.iter().find(|(key, _)| **key != scheduled).map(|(_, kp)| kp).expect("at least two delegates")
    }

    pub fn next_slot(&self, parent: &Block) -> u64 {
        self.params.slot_of(parent.timestamp) + 1
    }

    /// A block in the slot following the parent's, forged by the scheduled delegate
    pub fn next_block(&self, parent: &Block) -> Block {
        self.next_block_with(parent, vec![])
    }

    pub fn next_block_with(&self, parent: &Block, transactions: Vec<Transaction>) -> Block {
        self.block_at_slot(parent, self.next_slot(parent), transactions)
    }

    pub fn block_at_slot(&self, parent: &Block, slot: u64, transactions: Vec<Transaction>) -> Block {
        self.block_by(parent, slot, self.scheduled_keypair(slot), transactions)
    }

    /// A block at `slot` forged by a delegate the schedule does not assign to it
    pub fn block_by_other(&self, parent: &Block, slot: u64) -> Block {
        self.block_by(parent, slot, self.unscheduled_keypair(slot), vec![])
    }

    pub fn block_by(&self, parent: &Block, slot: u64, keypair: &Keypair, transactions: Vec<Transaction>) -> Block {
        build_block(&self.params, parent, self.params.slot_time(slot), transactions, keypair)
    }

    /// Builds `count` consecutive blocks on top of `parent`, one per slot
    pub fn chain(&self, parent: &Block, count: usize) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::with_capacity(count);
        for _ in 0..count {
            let block = self.next_block(blocks.last().unwrap_or(parent));
            blocks.push(block);
        }
        blocks
    }

    /// Re-signs a block after its fields were edited. The generator key picks the signing key pair.
    pub fn resign(&self, mut block: Block) -> Block {
        let keypair = *self.keypair(&block.generator_public_key).expect("block generator is known to the generator");
        sign_block(&mut block, &keypair);
        block
    }

    /// A transfer with a unique id
    pub fn transfer(&self, amount: u64) -> Transaction {
        let nonce = self.tx_nonce.fetch_add(1, Ordering::Relaxed);
        Transaction::new_transfer(nonce, self.sender(), format!("{}L", nonce), amount, 1)
    }

    /// A vote transaction; each entry is a `+` or `-` followed by a delegate public key
    pub fn vote(&self, votes: Vec<String>) -> Transaction {
        let nonce = self.tx_nonce.fetch_add(1, Ordering::Relaxed);
        Transaction::new_vote(nonce, self.sender(), votes, 1)
    }

    fn sender(&self) -> PublicKeyHex {
        self.keypairs.keys().next().cloned().unwrap_or_default()
    }
}
