//! Core ledger primitives for chaintrack.
//!
//! This crate provides the pieces shared by mining and validation:
//! - The hash function adapter (SHA-256 or BLAKE3, hex encoded)
//! - The proof-of-work predicate
//! - Canonical serialization of transaction sets
//! - Transactions and blocks

pub mod block;
pub mod canonical;
pub mod hash;
pub mod pow;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, MinedBlock};
pub use canonical::{block_preimage, serialize_transactions, transaction_fragment, CanonicalError};
pub use hash::{hash_hex, HashAlgorithm, H256, HEX_DIGEST_LEN};
pub use pow::{is_valid_pow, leading_zeros};
pub use transaction::{NewTransaction, Transaction};
