//! Block structures.

use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The output of a successful nonce search, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedBlock {
    /// Hash of the block this one extends ("" for genesis).
    pub previous_hash: String,
    /// The proof-of-work solution.
    pub hash: String,
    /// The winning nonce.
    pub nonce: u64,
    /// Transactions sealed by this block, in serialization order.
    pub transactions: Vec<Transaction>,
}

impl MinedBlock {
    /// Check if this block starts the chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_empty()
    }
}

/// A block as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Sequence number assigned on creation (first block is 1).
    pub id: u64,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Hash of the previous block ("" for genesis).
    pub previous_hash: String,
    /// Stored proof-of-work hash.
    pub hash: String,
    /// Proof-of-work witness.
    pub nonce: u64,
    /// Transactions loaded from the store at read time.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Materialize a mined block under the id the store assigned.
    pub fn from_mined(id: u64, timestamp: DateTime<Utc>, mined: MinedBlock) -> Self {
        Self {
            id,
            timestamp,
            previous_hash: mined.previous_hash,
            hash: mined.hash,
            nonce: mined.nonce,
            transactions: mined.transactions,
        }
    }

    /// Check if this block starts the chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_empty()
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Attach the transactions loaded for this block.
    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mined(previous_hash: &str) -> MinedBlock {
        MinedBlock {
            previous_hash: previous_hash.to_string(),
            hash: "0abc".to_string(),
            nonce: 9,
            transactions: vec![Transaction::new("A", "B", 1.0)],
        }
    }

    #[test]
    fn test_genesis_detection() {
        assert!(mined("").is_genesis());
        assert!(!mined("0fff").is_genesis());
    }

    #[test]
    fn test_from_mined() {
        let now = Utc::now();
        let block = Block::from_mined(3, now, mined("0fff"));
        assert_eq!(block.id, 3);
        assert_eq!(block.timestamp, now);
        assert_eq!(block.previous_hash, "0fff");
        assert_eq!(block.nonce, 9);
        assert_eq!(block.tx_count(), 1);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_with_transactions() {
        let block = Block::from_mined(1, Utc::now(), mined("")).with_transactions(Vec::new());
        assert_eq!(block.tx_count(), 0);
    }

    #[test]
    fn test_json_without_transactions_field() {
        let json = r#"{
            "id": 1,
            "timestamp": "2024-01-01T00:00:00Z",
            "previous_hash": "",
            "hash": "0abc",
            "nonce": 5
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.transactions.is_empty());
        assert!(block.is_genesis());
    }
}
