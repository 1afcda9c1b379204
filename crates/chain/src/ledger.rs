//! Ledger orchestration.
//!
//! This module brings together storage, the miner, and the chain validator.

use crate::config::LedgerConfig;
use chaintrack_consensus::{
    CancelToken, ChainValidator, Miner, MiningError, MiningOutcome, TransactionValidator,
    ValidationError, ValidationReport,
};
use chaintrack_core::{Block, NewTransaction, Transaction};
use chaintrack_storage::{ChainStore, Storage, StorageError, TransactionStore};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("mining error: {0}")]
    Mining(#[from] MiningError),

    #[error("invalid transaction: {}", join_errors(.0))]
    InvalidTransaction(Vec<ValidationError>),

    #[error("no transactions to mine")]
    NothingToMine,

    #[error("block not found: {0}")]
    BlockNotFound(u64),

    #[error("block {0} has no transactions")]
    EmptyBlock(u64),

    #[error("transaction {tx_id} is not part of block {block_id}")]
    TransactionNotInBlock { tx_id: Uuid, block_id: u64 },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// How a mining request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    /// The block was stored and its transactions claimed.
    Mined(Block),
    /// The search was cancelled; nothing was written.
    Cancelled { attempts: u64 },
    /// The iteration budget ran out; nothing was written.
    Exhausted { attempts: u64 },
}

/// Ledger statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Number of blocks in the chain.
    pub height: u64,
    /// Hash of the latest block ("" when empty).
    pub latest_hash: String,
    /// Total number of transactions.
    pub total_transactions: usize,
    /// Number of transactions waiting for a block.
    pub pending_transactions: usize,
    /// Configured difficulty.
    pub difficulty: u32,
}

/// The ledger service: submission, mining, queries and validation.
pub struct Ledger<'a> {
    chain: ChainStore<'a>,
    transactions: TransactionStore<'a>,
    miner: Miner,
    validator: ChainValidator,
}

impl<'a> Ledger<'a> {
    /// Create a ledger over `storage` with the given configuration.
    pub fn new(storage: &'a Storage, config: &LedgerConfig) -> Self {
        Self {
            chain: ChainStore::new(storage),
            transactions: TransactionStore::new(storage),
            miner: Miner::new(config.pow.clone()),
            validator: ChainValidator::new(config.pow.clone())
                .with_strict_linkage(config.strict_linkage),
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Validate and store a new transaction.
    pub fn submit_transaction(&self, request: NewTransaction) -> Result<Transaction> {
        let errors = TransactionValidator::check(&request);
        if !errors.is_empty() {
            return Err(LedgerError::InvalidTransaction(errors));
        }

        let tx = request.into_transaction();
        self.transactions.insert(&tx)?;
        info!(id = %tx.id, sender = %tx.sender, receiver = %tx.receiver, amount = tx.amount, "transaction submitted");
        Ok(tx)
    }

    /// Get a transaction by id.
    pub fn get_transaction(&self, id: &Uuid) -> Result<Option<Transaction>> {
        Ok(self.transactions.get(id)?)
    }

    /// All transactions in submission order.
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.list_all()?)
    }

    /// Transactions waiting for a block.
    pub fn pending_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.list_pending()?)
    }

    /// Transactions sealed in `block_id` (empty for unknown blocks).
    pub fn transactions_for_block(&self, block_id: u64) -> Result<Vec<Transaction>> {
        Ok(self.transactions.list_for_block(block_id)?)
    }

    // =========================================================================
    // Mining
    // =========================================================================

    /// Mine every pending transaction into a new block on top of the head.
    ///
    /// The nonce search runs on the calling thread. When `cancel` fires or
    /// the iteration budget runs out nothing is written.
    pub fn mine_block(&self, cancel: Option<&CancelToken>) -> Result<MineOutcome> {
        let pending = self.transactions.list_pending()?;
        if pending.is_empty() {
            return Err(LedgerError::NothingToMine);
        }
        let previous_hash = self.chain.head_hash()?;
        let count = pending.len();

        match self.miner.mine(pending, &previous_hash, cancel)? {
            MiningOutcome::Mined(mined) => {
                let nonce = mined.nonce;
                let block = self.chain.commit_block(mined)?;
                info!(
                    id = block.id,
                    hash = %block.hash,
                    nonce,
                    transactions = count,
                    "block mined"
                );
                Ok(MineOutcome::Mined(block))
            }
            MiningOutcome::Cancelled { attempts } => {
                warn!(attempts, "mining cancelled before a solution was found");
                Ok(MineOutcome::Cancelled { attempts })
            }
            MiningOutcome::Exhausted { attempts } => {
                warn!(attempts, "mining budget exhausted");
                Ok(MineOutcome::Exhausted { attempts })
            }
        }
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Number of blocks in the chain.
    pub fn height(&self) -> Result<u64> {
        Ok(self.chain.get_height()?)
    }

    /// Get a block with its transactions.
    pub fn get_block(&self, id: u64) -> Result<Option<Block>> {
        match self.chain.get_block(id)? {
            Some(block) => Ok(Some(self.attach_transactions(block)?)),
            None => Ok(None),
        }
    }

    /// Get the latest block with its transactions.
    pub fn latest_block(&self) -> Result<Option<Block>> {
        match self.chain.get_latest_block()? {
            Some(block) => Ok(Some(self.attach_transactions(block)?)),
            None => Ok(None),
        }
    }

    /// All blocks in creation order, with transactions.
    pub fn blocks(&self) -> Result<Vec<Block>> {
        self.chain
            .list_blocks()?
            .into_iter()
            .map(|block| self.attach_transactions(block))
            .collect()
    }

    fn attach_transactions(&self, block: Block) -> Result<Block> {
        let txs = self.transactions.list_for_block(block.id)?;
        Ok(block.with_transactions(txs))
    }

    /// Overwrite the amount of a transaction inside a mined block.
    ///
    /// Targets `tx_id` when given, otherwise the block's first transaction.
    /// The block hash is left alone so the change shows up in validation.
    pub fn tamper(&self, block_id: u64, tx_id: Option<Uuid>, amount: f64) -> Result<Transaction> {
        if self.chain.get_block(block_id)?.is_none() {
            return Err(LedgerError::BlockNotFound(block_id));
        }
        let members = self.transactions.list_for_block(block_id)?;

        let target = match tx_id {
            Some(id) => members
                .iter()
                .find(|tx| tx.id == id)
                .ok_or(LedgerError::TransactionNotInBlock { tx_id: id, block_id })?,
            None => members.first().ok_or(LedgerError::EmptyBlock(block_id))?,
        };

        let updated = self.transactions.set_amount(&target.id, amount)?;
        warn!(block_id, tx_id = %updated.id, amount, "transaction amount overwritten");
        Ok(updated)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Re-derive every block hash and check its proof of work.
    pub fn validate_chain(&self) -> Result<ValidationReport> {
        let blocks = self.chain.list_blocks()?;

        let mut by_block = HashMap::with_capacity(blocks.len());
        for block in &blocks {
            by_block.insert(block.id, self.transactions.list_for_block(block.id)?);
        }

        let report = self.validator.validate(&blocks, &by_block);
        if report.is_valid() {
            info!(blocks = report.blocks_checked, "chain is valid");
        } else {
            for violation in &report.violations {
                warn!(
                    block_id = violation.block_id,
                    kind = ?violation.kind,
                    expected = %violation.expected_hash,
                    stored = %violation.stored_hash,
                    "chain integrity violation"
                );
            }
        }
        Ok(report)
    }

    /// Get ledger statistics.
    pub fn stats(&self) -> Result<LedgerStats> {
        let all = self.transactions.list_all()?;
        Ok(LedgerStats {
            height: self.chain.get_height()?,
            latest_hash: self.chain.head_hash()?,
            pending_transactions: all.iter().filter(|tx| tx.is_pending()).count(),
            total_transactions: all.len(),
            difficulty: self.miner.config().difficulty,
        })
    }
}
