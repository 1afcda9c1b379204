//! Persistent storage layer for chaintrack.
//!
//! This crate provides the storage backend for the ledger:
//! - Transactions (by id, pending, by block)
//! - Blocks (by id, latest, in creation order)
//! - Atomic block commits that claim their transactions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! │              (Ledger service, HTTP API, CLI)             │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌──────────────────┐ ┌─────────────┐ ┌──────────────┐  │
//! │  │ TransactionStore │ │ ChainStore  │ │ Storage (DB) │  │
//! │  │  - Submission    │ │  - Blocks   │ │  - sled      │  │
//! │  │  - Pending       │ │  - Commit   │ │  - bincode   │  │
//! │  │  - Membership    │ │  - Height   │ │  - keys      │  │
//! │  └──────────────────┘ └─────────────┘ └──────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use chaintrack_storage::{ChainStore, Storage, TransactionStore};
//! use chaintrack_core::Transaction;
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//!
//! let txs = TransactionStore::new(&storage);
//! txs.insert(&Transaction::new("alice", "bob", 10.0)).unwrap();
//!
//! let chain = ChainStore::new(&storage);
//! println!("pending: {}", txs.pending_count().unwrap());
//! println!("height: {}", chain.get_height().unwrap());
//! ```

pub mod chain;
pub mod db;
pub mod transactions;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{Result, Storage, StorageError};
pub use transactions::TransactionStore;
