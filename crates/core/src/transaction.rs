//! Ledger transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value transfer recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: Uuid,
    /// Sending party.
    pub sender: String,
    /// Receiving party.
    pub receiver: String,
    /// Amount transferred.
    pub amount: f64,
    /// Whether the transaction has been included in a block.
    pub is_mined: bool,
    /// Owning block, set when mined.
    pub block_id: Option<u64>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new, unmined transaction with a fresh id.
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            is_mined: false,
            block_id: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the transaction still waits for a block.
    pub fn is_pending(&self) -> bool {
        !self.is_mined
    }

    /// Assign the transaction to a block.
    pub fn mark_mined(&mut self, block_id: u64) {
        self.is_mined = true;
        self.block_id = Some(block_id);
    }
}

/// The client-supplied part of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub amount: f64,
}

impl NewTransaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Turn the request into a stored record.
    pub fn into_transaction(self) -> Transaction {
        Transaction::new(self.sender, self.receiver, self.amount)
    }
}
