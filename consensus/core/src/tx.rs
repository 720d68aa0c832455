use crate::{PublicKeyHex, hashing};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Transaction type ids understood by this chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionType {
    Transfer = 0,
    SecondSignature = 1,
    Delegate = 2,
    Vote = 3,
    Multisignature = 4,
    Dapp = 5,
    InTransfer = 6,
    OutTransfer = 7,
}

impl TryFrom<u8> for TransactionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Transfer,
            1 => Self::SecondSignature,
            2 => Self::Delegate,
            3 => Self::Vote,
            4 => Self::Multisignature,
            5 => Self::Dapp,
            6 => Self::InTransfer,
            7 => Self::OutTransfer,
            unknown => return Err(unknown),
        })
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAsset {
    /// Vote entries of the form `+<delegate key>` or `-<delegate key>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<String>>,
}

/// A transaction as carried inside a block. Only the fields needed for block-level checks are
/// interpreted here; execution semantics belong to the transaction executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Raw type id, kept unparsed so that blocks carrying unknown types can still be decoded and rejected
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub timestamp: u64,
    pub sender_public_key: PublicKeyHex,
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub amount: u64,
    pub fee: u64,
    #[serde(default)]
    pub asset: TransactionAsset,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Transaction {
    /// Creates a transaction and derives its id from the canonical bytes
    pub fn new(
        tx_type: u8,
        timestamp: u64,
        sender_public_key: PublicKeyHex,
        recipient_id: Option<String>,
        amount: u64,
        fee: u64,
        asset: TransactionAsset,
    ) -> Self {
        let mut tx =
            Self { id: String::new(), tx_type, timestamp, sender_public_key, recipient_id, amount, fee, asset, signature: None };
        tx.finalize();
        tx
    }

    pub fn new_transfer(timestamp: u64, sender_public_key: PublicKeyHex, recipient_id: String, amount: u64, fee: u64) -> Self {
        Self::new(TransactionType::Transfer as u8, timestamp, sender_public_key, Some(recipient_id), amount, fee, Default::default())
    }

    pub fn new_vote(timestamp: u64, sender_public_key: PublicKeyHex, votes: Vec<String>, fee: u64) -> Self {
        Self::new(TransactionType::Vote as u8, timestamp, sender_public_key, None, 0, fee, TransactionAsset { votes: Some(votes) })
    }

    /// Recomputes the id after a field was changed
    pub fn finalize(&mut self) {
        self.id = hashing::tx::transaction_id(self);
    }

    pub fn kind(&self) -> Option<TransactionType> {
        TransactionType::try_from(self.tx_type).ok()
    }

    pub fn votes(&self) -> &[String] {
        self.asset.votes.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_conversion() {
        for id in 0u8..8 {
            assert_eq!(TransactionType::try_from(id).map(|t| t as u8), Ok(id));
        }
        assert_eq!(TransactionType::try_from(99), Err(99));
    }

    #[test]
    fn test_transaction_id_tracks_content() {
        let key = "aa".repeat(32);
        let tx = Transaction::new_transfer(10, key.clone(), "123L".into(), 100, 10);
        let mut other = tx.clone();
        assert_eq!(tx.id, other.id);
        other.amount += 1;
        other.finalize();
        assert_ne!(tx.id, other.id);
        assert!(tx.id.chars().all(|c| c.is_ascii_digit()));

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], 0);
        assert_eq!(json["senderPublicKey"], key);
    }
}
