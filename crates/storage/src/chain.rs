//! Block storage and chain state management.

use crate::db::{
    abort, tx_get, tx_next_seq, tx_put, Result, Storage, StorageError, TxResult, BLOCK_PREFIX,
    BLOCK_SEQ_KEY,
};
use chaintrack_core::{Block, MinedBlock, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionalTree;
use uuid::Uuid;

/// Persisted form of a block. Transactions are not embedded; they are
/// reloaded through the block membership index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockRecord {
    id: u64,
    timestamp: DateTime<Utc>,
    previous_hash: String,
    hash: String,
    nonce: u64,
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        Block {
            id: record.id,
            timestamp: record.timestamp,
            previous_hash: record.previous_hash,
            hash: record.hash,
            nonce: record.nonce,
            transactions: Vec::new(),
        }
    }
}

/// Manages block storage and chain state.
pub struct ChainStore<'a> {
    storage: &'a Storage,
}

impl<'a> ChainStore<'a> {
    /// Create a new ChainStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // =========================================================================
    // Block Queries
    // =========================================================================

    /// Get a block by id (without its transactions).
    pub fn get_block(&self, id: u64) -> Result<Option<Block>> {
        let record: Option<BlockRecord> = self.storage.get(Storage::block_key(id))?;
        Ok(record.map(Block::from))
    }

    /// Id of the most recent block, 0 when the chain is empty.
    pub fn get_height(&self) -> Result<u64> {
        Ok(self.storage.get::<_, u64>(BLOCK_SEQ_KEY)?.unwrap_or(0))
    }

    /// Get the most recently created block.
    pub fn get_latest_block(&self) -> Result<Option<Block>> {
        match self.get_height()? {
            0 => Ok(None),
            height => self.get_block(height),
        }
    }

    /// Hash the next block must extend ("" for an empty chain).
    pub fn head_hash(&self) -> Result<String> {
        Ok(self
            .get_latest_block()?
            .map(|block| block.hash)
            .unwrap_or_default())
    }

    /// All blocks in creation order.
    pub fn list_blocks(&self) -> Result<Vec<Block>> {
        let records: Vec<BlockRecord> = self.storage.scan_values(BLOCK_PREFIX)?;
        Ok(records.into_iter().map(Block::from).collect())
    }

    // =========================================================================
    // Block Creation
    // =========================================================================

    /// Persist a mined block under the next id without touching its
    /// transactions. Prefer [`ChainStore::commit_block`].
    pub fn create_block(&self, mined: &MinedBlock) -> Result<Block> {
        let timestamp = Utc::now();
        let record = self
            .storage
            .transaction(|t| insert_record(t, mined, timestamp))?;
        Ok(record.into())
    }

    /// Mark a single transaction as mined in `block_id`.
    pub fn mark_mined(&self, tx_id: &Uuid, block_id: u64) -> Result<Transaction> {
        self.storage
            .transaction(|t| claim_transaction(t, tx_id, block_id))
    }

    /// Persist a mined block and claim all of its transactions atomically.
    ///
    /// Fails with [`StorageError::AlreadyMined`] without writing anything if
    /// any transaction was claimed by another block in the meantime.
    pub fn commit_block(&self, mined: MinedBlock) -> Result<Block> {
        let timestamp = Utc::now();

        let (record, transactions) = self.storage.transaction(|t| {
            let record = insert_record(t, &mined, timestamp)?;
            let mut claimed = Vec::with_capacity(mined.transactions.len());
            for tx in &mined.transactions {
                claimed.push(claim_transaction(t, &tx.id, record.id)?);
            }
            Ok((record, claimed))
        })?;

        Ok(Block::from(record).with_transactions(transactions))
    }
}

fn insert_record(
    t: &TransactionalTree,
    mined: &MinedBlock,
    timestamp: DateTime<Utc>,
) -> TxResult<BlockRecord> {
    let id = tx_next_seq(t, BLOCK_SEQ_KEY)?;
    let record = BlockRecord {
        id,
        timestamp,
        previous_hash: mined.previous_hash.clone(),
        hash: mined.hash.clone(),
        nonce: mined.nonce,
    };
    tx_put(t, &Storage::block_key(id), &record)?;
    Ok(record)
}

fn claim_transaction(t: &TransactionalTree, tx_id: &Uuid, block_id: u64) -> TxResult<Transaction> {
    let Some(seq) = tx_get::<u64>(t, &Storage::transaction_id_key(tx_id))? else {
        return abort(StorageError::NotFound(format!("transaction {tx_id}")));
    };
    let key = Storage::transaction_key(seq);
    let Some(mut tx) = tx_get::<Transaction>(t, &key)? else {
        return abort(StorageError::NotFound(format!("transaction {tx_id}")));
    };
    if tx.is_mined {
        return abort(StorageError::AlreadyMined {
            id: tx.id,
            block_id: tx.block_id,
        });
    }

    tx.mark_mined(block_id);
    tx_put(t, &key, &tx)?;
    tx_put(t, &Storage::block_transaction_key(block_id, seq), &seq)?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::TransactionStore;

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn submit(storage: &Storage, txs: &[Transaction]) {
        let store = TransactionStore::new(storage);
        for tx in txs {
            store.insert(tx).unwrap();
        }
    }

    fn mined(previous_hash: &str, transactions: Vec<Transaction>) -> MinedBlock {
        MinedBlock {
            previous_hash: previous_hash.to_string(),
            hash: format!("0{}", transactions.len()),
            nonce: 1,
            transactions,
        }
    }

    #[test]
    fn test_empty_chain() {
        let storage = setup();
        let chain = ChainStore::new(&storage);

        assert_eq!(chain.get_height().unwrap(), 0);
        assert!(chain.get_latest_block().unwrap().is_none());
        assert_eq!(chain.head_hash().unwrap(), "");
        assert!(chain.list_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_commit_block_claims_transactions() {
        let storage = setup();
        let txs = vec![Transaction::new("A", "B", 1.0), Transaction::new("C", "D", 2.0)];
        submit(&storage, &txs);

        let chain = ChainStore::new(&storage);
        let block = chain.commit_block(mined("", txs.clone())).unwrap();

        assert_eq!(block.id, 1);
        assert_eq!(block.tx_count(), 2);
        assert!(block.transactions.iter().all(|tx| tx.block_id == Some(1)));

        let store = TransactionStore::new(&storage);
        assert!(store.list_pending().unwrap().is_empty());
        let members = store.list_for_block(1).unwrap();
        assert_eq!(
            members.iter().map(|tx| tx.id).collect::<Vec<_>>(),
            txs.iter().map(|tx| tx.id).collect::<Vec<_>>()
        );
        assert!(members.iter().all(|tx| tx.is_mined));
    }

    #[test]
    fn test_block_ids_are_sequential() {
        let storage = setup();
        let chain = ChainStore::new(&storage);

        for expected in 1..=3u64 {
            let tx = Transaction::new("A", "B", expected as f64);
            submit(&storage, std::slice::from_ref(&tx));
            let prev = chain.head_hash().unwrap();
            let block = chain.commit_block(mined(&prev, vec![tx])).unwrap();
            assert_eq!(block.id, expected);
        }

        assert_eq!(chain.get_height().unwrap(), 3);
        let ids: Vec<_> = chain.list_blocks().unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(chain.get_latest_block().unwrap().unwrap().id, 3);
    }

    #[test]
    fn test_stored_block_has_no_embedded_transactions() {
        let storage = setup();
        let tx = Transaction::new("A", "B", 1.0);
        submit(&storage, std::slice::from_ref(&tx));

        let chain = ChainStore::new(&storage);
        let committed = chain.commit_block(mined("", vec![tx])).unwrap();

        let loaded = chain.get_block(committed.id).unwrap().unwrap();
        assert!(loaded.transactions.is_empty());
        assert_eq!(loaded.hash, committed.hash);
        assert_eq!(loaded.nonce, committed.nonce);
        assert_eq!(loaded.timestamp, committed.timestamp);
    }

    #[test]
    fn test_double_claim_rolls_back() {
        let storage = setup();
        let a = Transaction::new("A", "B", 1.0);
        let b = Transaction::new("C", "D", 2.0);
        submit(&storage, &[a.clone(), b.clone()]);

        let chain = ChainStore::new(&storage);
        chain.commit_block(mined("", vec![a.clone()])).unwrap();

        // a second miner raced on the same pending set
        let result = chain.commit_block(mined("", vec![b.clone(), a.clone()]));
        assert!(matches!(
            result,
            Err(StorageError::AlreadyMined { id, block_id: Some(1) }) if id == a.id
        ));

        // neither the block nor the claim on `b` was written
        assert_eq!(chain.get_height().unwrap(), 1);
        let store = TransactionStore::new(&storage);
        assert!(store.get(&b.id).unwrap().unwrap().is_pending());
        assert!(store.list_for_block(2).unwrap().is_empty());
    }

    #[test]
    fn test_commit_unknown_transaction_fails() {
        let storage = setup();
        let chain = ChainStore::new(&storage);

        let result = chain.commit_block(mined("", vec![Transaction::new("A", "B", 1.0)]));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(chain.get_height().unwrap(), 0);
    }

    #[test]
    fn test_create_then_mark_separately() {
        let storage = setup();
        let tx = Transaction::new("A", "B", 1.0);
        submit(&storage, std::slice::from_ref(&tx));

        let chain = ChainStore::new(&storage);
        let block = chain.create_block(&mined("", vec![tx.clone()])).unwrap();
        assert_eq!(block.id, 1);
        assert!(block.transactions.is_empty());

        let store = TransactionStore::new(&storage);
        assert_eq!(store.pending_count().unwrap(), 1);

        let marked = chain.mark_mined(&tx.id, block.id).unwrap();
        assert_eq!(marked.block_id, Some(1));
        assert_eq!(store.pending_count().unwrap(), 0);

        assert!(matches!(
            chain.mark_mined(&tx.id, 2),
            Err(StorageError::AlreadyMined { .. })
        ));
    }
}
