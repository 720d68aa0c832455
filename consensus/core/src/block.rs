use crate::{BlockId, PublicKeyHex, tx::Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A delegate-produced block. Field names serialize in camelCase, matching the gossip format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub version: u32,
    /// Seconds since the chain epoch
    pub timestamp: u64,
    pub height: u64,
    /// `None` only for genesis
    pub previous_block: Option<BlockId>,
    pub number_of_transactions: u32,
    pub total_amount: u64,
    pub total_fee: u64,
    pub reward: u64,
    pub payload_length: u32,
    pub payload_hash: String,
    pub generator_public_key: PublicKeyHex,
    pub block_signature: String,
    #[serde(default)]
    pub transactions: Arc<Vec<Transaction>>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.previous_block.is_none()
    }

    pub fn previous_block_id(&self) -> Option<&str> {
        self.previous_block.as_deref()
    }

    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            height: self.height,
            id: self.id.clone(),
            previous_block: self.previous_block.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// The observational projection of a block used in logs, fork events and peer exchanges
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    pub height: u64,
    pub id: BlockId,
    pub previous_block: Option<BlockId>,
    pub timestamp: u64,
}

impl From<&Block> for BlockSnapshot {
    fn from(block: &Block) -> Self {
        block.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_json_shape() {
        let block = Block {
            id: "10".into(),
            version: 0,
            timestamp: 30,
            height: 2,
            previous_block: Some("9".into()),
            number_of_transactions: 0,
            total_amount: 0,
            total_fee: 0,
            reward: 0,
            payload_length: 0,
            payload_hash: "ab".into(),
            generator_public_key: "cd".into(),
            block_signature: "ef".into(),
            transactions: Default::default(),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["previousBlock"], json!("9"));
        assert_eq!(value["generatorPublicKey"], json!("cd"));
        assert_eq!(value["numberOfTransactions"], json!(0));

        let decoded: Block = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(
            serde_json::to_value(block.snapshot()).unwrap(),
            json!({ "height": 2, "id": "10", "previousBlock": "9", "timestamp": 30 })
        );
    }
}
