use super::{CanonicalWriter, id_from_digest};
use crate::tx::Transaction;
use sha2::{Digest, Sha256};

/// Canonical bytes of a transaction, excluding its id
pub fn transaction_bytes(tx: &Transaction) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_transaction(&mut bytes, tx);
    bytes
}

pub fn transaction_id(tx: &Transaction) -> String {
    id_from_digest(&Sha256::digest(transaction_bytes(tx)))
}

fn write_transaction<W: CanonicalWriter>(writer: &mut W, tx: &Transaction) {
    writer
        .write_u8(tx.tx_type)
        .write_u64(tx.timestamp)
        .write_hex(&tx.sender_public_key)
        .write_opt_str(tx.recipient_id.as_deref())
        .write_u64(tx.amount)
        .write_u64(tx.fee);
    let votes = tx.votes();
    writer.write_u64(votes.len() as u64);
    for vote in votes {
        writer.write_str(vote);
    }
    match &tx.signature {
        Some(signature) => writer.write_u8(1).write_hex(signature),
        None => writer.write_u8(0),
    };
}
