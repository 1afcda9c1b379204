//! Proof-of-work consensus for chaintrack.
//!
//! This crate provides:
//! - The nonce-search miner with cooperative cancellation
//! - The chain validator that re-derives block hashes and checks the work
//! - Field-level validation of submitted transactions
//!
//! # Example
//!
//! ```rust
//! use chaintrack_consensus::{ChainValidator, Miner, PowConfig};
//! use chaintrack_core::{Block, Transaction};
//!
//! let config = PowConfig::new(1);
//! let mined = Miner::new(config.clone())
//!     .mine(vec![Transaction::new("A", "B", 10.0)], "", None)
//!     .unwrap()
//!     .into_block()
//!     .unwrap();
//! assert!(mined.hash.starts_with('0'));
//!
//! let block = Block::from_mined(1, chrono::Utc::now(), mined);
//! let report = ChainValidator::new(config).validate_blocks(&[block]);
//! assert!(report.is_valid());
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{CancelToken, Miner, MiningError, MiningOutcome, PowConfig, DEFAULT_DIFFICULTY};
pub use validator::{
    ChainValidator, TransactionValidator, ValidationError, ValidationReport, Violation,
    ViolationKind,
};
