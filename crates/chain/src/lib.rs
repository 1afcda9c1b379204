//! Ledger orchestration for chaintrack.
//!
//! This crate brings the other components together:
//! - **Storage**: transactions and blocks in sled
//! - **Consensus**: proof-of-work mining and chain validation
//! - **Config**: the `config.json` kept in the data directory
//!
//! # Example
//!
//! ```rust,no_run
//! use chaintrack_chain::{Ledger, LedgerConfig, MineOutcome};
//! use chaintrack_core::NewTransaction;
//! use chaintrack_storage::Storage;
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//! let config = LedgerConfig::with_difficulty(4);
//! let ledger = Ledger::new(&storage, &config);
//!
//! ledger
//!     .submit_transaction(NewTransaction::new("alice", "bob", 10.0))
//!     .unwrap();
//!
//! if let MineOutcome::Mined(block) = ledger.mine_block(None).unwrap() {
//!     println!("mined block {} with hash {}", block.id, block.hash);
//! }
//!
//! assert!(ledger.validate_chain().unwrap().is_valid());
//! ```

pub mod config;
pub mod ledger;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig};
pub use ledger::{Ledger, LedgerError, LedgerStats, MineOutcome};
