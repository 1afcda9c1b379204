//! Transaction input rules and chain integrity checks.

use crate::pow::PowConfig;
use chaintrack_core::{serialize_transactions, Block, CanonicalError, NewTransaction, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when a submitted transaction is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sender is required")]
    MissingSender,

    #[error("receiver is required")]
    MissingReceiver,

    #[error("amount must be a finite number")]
    NonFiniteAmount,

    #[error("amount must be greater than zero")]
    NonPositiveAmount,
}

impl ValidationError {
    /// The request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingSender => "sender",
            Self::MissingReceiver => "receiver",
            Self::NonFiniteAmount | Self::NonPositiveAmount => "amount",
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Field-level validation of submitted transactions.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Collect every rule the request breaks.
    pub fn check(tx: &NewTransaction) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if tx.sender.trim().is_empty() {
            errors.push(ValidationError::MissingSender);
        }
        if tx.receiver.trim().is_empty() {
            errors.push(ValidationError::MissingReceiver);
        }
        if !tx.amount.is_finite() {
            errors.push(ValidationError::NonFiniteAmount);
        } else if tx.amount <= 0.0 {
            errors.push(ValidationError::NonPositiveAmount);
        }

        errors
    }

    /// Validate a request, returning the first broken rule.
    pub fn validate_transaction(tx: &NewTransaction) -> Result<()> {
        match Self::check(tx).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Why a block failed integrity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The recomputed hash differs from the stored one.
    HashMismatch,
    /// The stored hash does not satisfy the difficulty.
    InsufficientWork,
    /// The block's transactions could not be canonicalized.
    Unserializable,
    /// The previous-hash link does not match the preceding block.
    BrokenLink,
}

/// A single integrity failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub block_id: u64,
    /// For link checks this is the hash the link should have pointed to.
    pub expected_hash: String,
    pub stored_hash: String,
    pub kind: ViolationKind,
}

/// Result of walking a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of blocks inspected.
    pub blocks_checked: usize,
    /// Failures in chain order.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations recorded against one block.
    pub fn violations_for(&self, block_id: u64) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.block_id == block_id)
    }
}

/// Re-derives block hashes and checks proof of work.
///
/// Each block is checked on its own. Previous-hash linkage between
/// consecutive blocks is only verified when strict linkage is enabled.
#[derive(Debug, Clone, Default)]
pub struct ChainValidator {
    config: PowConfig,
    strict_linkage: bool,
}

impl ChainValidator {
    pub fn new(config: PowConfig) -> Self {
        Self {
            config,
            strict_linkage: false,
        }
    }

    /// Also report blocks whose previous hash does not match their predecessor.
    pub fn with_strict_linkage(mut self, strict: bool) -> Self {
        self.strict_linkage = strict;
        self
    }

    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// Recompute the hash `block` should carry given `transactions`.
    pub fn expected_hash(
        &self,
        block: &Block,
        transactions: &[Transaction],
    ) -> std::result::Result<String, CanonicalError> {
        let serialized = serialize_transactions(transactions)?;
        Ok(self
            .config
            .block_hash(&serialized, &block.previous_hash, block.nonce))
    }

    /// Check one block's hash and proof of work.
    pub fn check_block(&self, block: &Block, transactions: &[Transaction]) -> Option<Violation> {
        let (expected_hash, kind) = match self.expected_hash(block, transactions) {
            Err(_) => (String::new(), ViolationKind::Unserializable),
            Ok(expected) if expected != block.hash => (expected, ViolationKind::HashMismatch),
            Ok(expected) if !self.config.meets_difficulty(&block.hash) => {
                (expected, ViolationKind::InsufficientWork)
            }
            Ok(_) => return None,
        };

        Some(Violation {
            block_id: block.id,
            expected_hash,
            stored_hash: block.hash.clone(),
            kind,
        })
    }

    /// Walk `blocks` in order, using `transactions_by_block` for each block's
    /// contents. A block with no entry is treated as having no transactions.
    pub fn validate(
        &self,
        blocks: &[Block],
        transactions_by_block: &HashMap<u64, Vec<Transaction>>,
    ) -> ValidationReport {
        self.walk(blocks, |block| {
            transactions_by_block
                .get(&block.id)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        })
    }

    /// Walk `blocks` in order, using the transactions attached to each block.
    pub fn validate_blocks(&self, blocks: &[Block]) -> ValidationReport {
        self.walk(blocks, |block| block.transactions.as_slice())
    }

    fn walk<'a, F>(&self, blocks: &'a [Block], transactions_of: F) -> ValidationReport
    where
        F: Fn(&'a Block) -> &'a [Transaction],
    {
        let mut report = ValidationReport::default();
        let mut previous: Option<&Block> = None;

        for block in blocks {
            report.blocks_checked += 1;

            if let Some(violation) = self.check_block(block, transactions_of(block)) {
                report.violations.push(violation);
            }

            if self.strict_linkage {
                let linked_to = previous.map(|p| p.hash.as_str()).unwrap_or("");
                if block.previous_hash != linked_to {
                    report.violations.push(Violation {
                        block_id: block.id,
                        expected_hash: linked_to.to_string(),
                        stored_hash: block.previous_hash.clone(),
                        kind: ViolationKind::BrokenLink,
                    });
                }
            }

            previous = Some(block);
        }

        report
    }
}
