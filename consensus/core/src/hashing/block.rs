use super::{CanonicalWriter, decode_hex, id_from_digest, tx::transaction_bytes};
use crate::{BlockId, block::Block, tx::Transaction};
use faster_hex::hex_string;
use sha2::{Digest, Sha256};

/// Digest of the transaction set carried by a block along with its canonical byte length
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadDigest {
    pub hash: String,
    pub length: u32,
}

pub fn payload_digest(transactions: &[Transaction]) -> PayloadDigest {
    let mut hasher = Sha256::new();
    let mut length = 0usize;
    for tx in transactions {
        let bytes = transaction_bytes(tx);
        length += bytes.len();
        hasher.write_bytes(&bytes);
    }
    PayloadDigest { hash: hex_string(&hasher.finalize()), length: length.try_into().unwrap_or(u32::MAX) }
}

/// The message signed by the generator: every header field except the id and the signature
pub fn signing_hash(block: &Block) -> [u8; 32] {
    let mut hasher = Sha256::new();
    write_unsigned_header(&mut hasher, block);
    hasher.finalize().into()
}

/// Id of a signed block, derived from the header together with its signature
pub fn block_id(block: &Block) -> BlockId {
    let mut hasher = Sha256::new();
    write_unsigned_header(&mut hasher, block);
    match decode_hex(&block.block_signature) {
        Some(signature) => hasher.write_var_bytes(&signature),
        None => hasher.write_str(&block.block_signature),
    };
    id_from_digest(&hasher.finalize())
}

fn write_unsigned_header<W: CanonicalWriter>(writer: &mut W, block: &Block) {
    writer
        .write_u32(block.version)
        .write_u64(block.timestamp)
        .write_u64(block.height)
        .write_opt_str(block.previous_block.as_deref())
        .write_u32(block.number_of_transactions)
        .write_u64(block.total_amount)
        .write_u64(block.total_fee)
        .write_u64(block.reward)
        .write_u32(block.payload_length)
        .write_hex(&block.payload_hash)
        .write_hex(&block.generator_public_key);
}
