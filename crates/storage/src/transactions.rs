//! Transaction records.

use crate::db::{
    abort, tx_get, tx_next_seq, tx_put, Result, Storage, StorageError, TRANSACTION_PREFIX,
    TX_SEQ_KEY,
};
use chaintrack_core::Transaction;
use uuid::Uuid;

/// Stores transactions in submission order.
///
/// Each record lives under its insertion sequence number, which is the
/// order every listing returns them in. A secondary index maps the UUID to
/// the sequence number.
pub struct TransactionStore<'a> {
    storage: &'a Storage,
}

impl<'a> TransactionStore<'a> {
    /// Create a new TransactionStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Insert a new transaction.
    pub fn insert(&self, tx: &Transaction) -> Result<()> {
        let id_key = Storage::transaction_id_key(&tx.id);

        self.storage.transaction(|t| {
            if t.get(&id_key)?.is_some() {
                return abort(StorageError::DuplicateTransaction(tx.id));
            }
            let seq = tx_next_seq(t, TX_SEQ_KEY)?;
            tx_put(t, &Storage::transaction_key(seq), tx)?;
            tx_put(t, &id_key, &seq)?;
            Ok(())
        })
    }

    /// Get a transaction by id.
    pub fn get(&self, id: &Uuid) -> Result<Option<Transaction>> {
        match self.storage.get::<_, u64>(Storage::transaction_id_key(id))? {
            Some(seq) => self.storage.get(Storage::transaction_key(seq)),
            None => Ok(None),
        }
    }

    /// All transactions, oldest first.
    pub fn list_all(&self) -> Result<Vec<Transaction>> {
        self.storage.scan_values(TRANSACTION_PREFIX)
    }

    /// Transactions not yet included in a block, oldest first.
    pub fn list_pending(&self) -> Result<Vec<Transaction>> {
        let mut all = self.list_all()?;
        all.retain(Transaction::is_pending);
        Ok(all)
    }

    /// Number of pending transactions.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.list_pending()?.len())
    }

    /// Transactions belonging to `block_id`, in submission order.
    pub fn list_for_block(&self, block_id: u64) -> Result<Vec<Transaction>> {
        let seqs: Vec<u64> = self
            .storage
            .scan_values(&Storage::block_transactions_prefix(block_id))?;

        let mut txs = Vec::with_capacity(seqs.len());
        for seq in seqs {
            let key = Storage::transaction_key(seq);
            txs.push(self.storage.get_or_err(key)?);
        }
        Ok(txs)
    }

    /// Overwrite the amount of a stored transaction.
    ///
    /// This is the tamper path used to demonstrate chain validation; it
    /// deliberately leaves the owning block's hash untouched.
    pub fn set_amount(&self, id: &Uuid, amount: f64) -> Result<Transaction> {
        let id_key = Storage::transaction_id_key(id);

        self.storage.transaction(|t| {
            let Some(seq) = tx_get::<u64>(t, &id_key)? else {
                return abort(StorageError::NotFound(format!("transaction {id}")));
            };
            let key = Storage::transaction_key(seq);
            let Some(mut tx) = tx_get::<Transaction>(t, &key)? else {
                return abort(StorageError::NotFound(format!("transaction {id}")));
            };
            tx.amount = amount;
            tx_put(t, &key, &tx)?;
            Ok(tx)
        })
    }
}
