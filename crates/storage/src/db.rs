//! sled database wrapper with serialization helpers.

use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Db;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Transaction {0} already exists")]
    DuplicateTransaction(Uuid),

    #[error("Transaction {id} is already mined in block {block_id:?}")]
    AlreadyMined { id: Uuid, block_id: Option<u64> },
}

impl From<TransactionError<StorageError>> for StorageError {
    fn from(err: TransactionError<StorageError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StorageError::Database(e),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Result type inside a sled transaction closure.
pub type TxResult<T> = ConflictableTransactionResult<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = bincode::serialize(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Retrieve a value, returning error if not found.
    pub fn get_or_err<K, V>(&self, key: K) -> Result<V>
    where
        K: AsRef<[u8]> + std::fmt::Debug + Clone,
        V: serde::de::DeserializeOwned,
    {
        self.get(key.clone())?
            .ok_or_else(|| StorageError::NotFound(format!("{:?}", key)))
    }

    /// Check if a key exists.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Deserialize every value whose key starts with `prefix`, in key order.
    pub fn scan_values<V>(&self, prefix: &[u8]) -> Result<Vec<V>>
    where
        V: serde::de::DeserializeOwned,
    {
        let mut values = Vec::new();
        for entry in self.db.scan_prefix(prefix) {
            let (_, bytes) = entry?;
            values.push(bincode::deserialize(&bytes)?);
        }
        Ok(values)
    }

    /// Run `f` as a single atomic sled transaction.
    ///
    /// sled may re-run the closure on conflict, so it must not have side
    /// effects outside the transactional tree.
    pub fn transaction<F, A>(&self, f: F) -> Result<A>
    where
        F: Fn(&TransactionalTree) -> TxResult<A>,
    {
        Ok(self.db.transaction(f)?)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Transactions by insertion sequence.
    /// Format: "tx:" + seq (big endian)
    pub fn transaction_key(seq: u64) -> Vec<u8> {
        let mut key = TRANSACTION_PREFIX.to_vec();
        key.extend_from_slice(&seq.to_be_bytes());
        key
    }

    /// Sequence number by transaction id.
    /// Format: "txid:" + uuid_bytes
    pub fn transaction_id_key(id: &Uuid) -> Vec<u8> {
        let mut key = b"txid:".to_vec();
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Blocks by id.
    /// Format: "block:" + id (big endian)
    pub fn block_key(id: u64) -> Vec<u8> {
        let mut key = BLOCK_PREFIX.to_vec();
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    /// Prefix of the block membership index for one block.
    /// Format: "blocktx:" + block_id (big endian)
    pub fn block_transactions_prefix(block_id: u64) -> Vec<u8> {
        let mut key = b"blocktx:".to_vec();
        key.extend_from_slice(&block_id.to_be_bytes());
        key
    }

    /// Block membership entry.
    /// Format: "blocktx:" + block_id + seq (both big endian)
    pub fn block_transaction_key(block_id: u64, seq: u64) -> Vec<u8> {
        let mut key = Self::block_transactions_prefix(block_id);
        key.extend_from_slice(&seq.to_be_bytes());
        key
    }
}

pub(crate) const TRANSACTION_PREFIX: &[u8] = b"tx:";
pub(crate) const BLOCK_PREFIX: &[u8] = b"block:";
pub(crate) const TX_SEQ_KEY: &[u8] = b"meta:tx_seq";
pub(crate) const BLOCK_SEQ_KEY: &[u8] = b"meta:block_seq";

/// Read and deserialize a value inside a transaction.
pub(crate) fn tx_get<V>(tree: &TransactionalTree, key: &[u8]) -> TxResult<Option<V>>
where
    V: serde::de::DeserializeOwned,
{
    match tree.get(key)? {
        Some(bytes) => bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| ConflictableTransactionError::Abort(e.into())),
        None => Ok(None),
    }
}

/// Serialize and write a value inside a transaction.
pub(crate) fn tx_put<V>(tree: &TransactionalTree, key: &[u8], value: &V) -> TxResult<()>
where
    V: serde::Serialize,
{
    let encoded =
        bincode::serialize(value).map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
    tree.insert(key, encoded)?;
    Ok(())
}

/// Increment the counter at `key` and return the new value (first is 1).
pub(crate) fn tx_next_seq(tree: &TransactionalTree, key: &[u8]) -> TxResult<u64> {
    let next = tx_get::<u64>(tree, key)?.unwrap_or(0) + 1;
    tx_put(tree, key, &next)?;
    Ok(next)
}

/// Abort the surrounding transaction with `err`.
pub(crate) fn abort<T>(err: StorageError) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_temporary() {
        let storage = Storage::open_temporary().unwrap();
        assert!(storage.db.is_empty());
    }

    #[test]
    fn test_put_get() {
        let storage = Storage::open_temporary().unwrap();

        storage.put("key1", &42u64).unwrap();

        let value: Option<u64> = storage.get("key1").unwrap();
        assert_eq!(value, Some(42));

        let missing: Option<u64> = storage.get("missing").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_get_or_err() {
        let storage = Storage::open_temporary().unwrap();

        storage.put("exists", &100u64).unwrap();

        let value: u64 = storage.get_or_err("exists").unwrap();
        assert_eq!(value, 100);

        let result: Result<u64> = storage.get_or_err("missing");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_scan_values_in_key_order() {
        let storage = Storage::open_temporary().unwrap();
        for seq in [3u64, 1, 2] {
            storage.put(Storage::transaction_key(seq), &seq).unwrap();
        }
        storage.put(Storage::block_key(1), &99u64).unwrap();

        let values: Vec<u64> = storage.scan_values(TRANSACTION_PREFIX).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_sequence_counter() {
        let storage = Storage::open_temporary().unwrap();
        let first = storage.transaction(|t| tx_next_seq(t, TX_SEQ_KEY)).unwrap();
        let second = storage.transaction(|t| tx_next_seq(t, TX_SEQ_KEY)).unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_aborted_transaction_writes_nothing() {
        let storage = Storage::open_temporary().unwrap();

        let result: Result<()> = storage.transaction(|t| {
            tx_put(t, b"a", &1u64)?;
            abort(StorageError::NotFound("b".into()))
        });

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.contains("a").unwrap());
    }

    #[test]
    fn test_key_prefixes_do_not_overlap() {
        let id = Uuid::new_v4();
        assert!(Storage::transaction_key(1).starts_with(TRANSACTION_PREFIX));
        assert!(!Storage::transaction_id_key(&id).starts_with(TRANSACTION_PREFIX));
        assert!(Storage::block_key(1).starts_with(BLOCK_PREFIX));
        assert!(!Storage::block_transaction_key(1, 1).starts_with(BLOCK_PREFIX));
        assert!(Storage::block_transaction_key(7, 3)
            .starts_with(&Storage::block_transactions_prefix(7)));
    }
}
