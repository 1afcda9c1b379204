//! Proof-of-work mining.
//!
//! The miner searches nonces sequentially from zero until
//! `H(serialize(txs) + previous_hash + nonce)` carries the configured number
//! of leading zero hex digits. The search runs on the calling thread; callers
//! that need to bound it pass a [`CancelToken`] or set
//! [`PowConfig::max_iterations`].

use chaintrack_core::{
    block_preimage, is_valid_pow, serialize_transactions, CanonicalError, HashAlgorithm,
    MinedBlock, Transaction, HEX_DIGEST_LEN,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Leading zero hex digits required when nothing else is configured.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Errors that can occur while mining.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("no transactions to mine")]
    EmptyTransactionSet,

    #[error("difficulty {difficulty} exceeds the {max}-digit hash length")]
    UnreachableDifficulty { difficulty: u32, max: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] CanonicalError),

    #[error("nonce space exhausted after {attempts} attempts")]
    NonceOverflow { attempts: u64 },
}

impl MiningError {
    /// Whether the error comes from bad caller input rather than the search.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyTransactionSet | Self::UnreachableDifficulty { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// Proof-of-work parameters shared by the miner and the chain validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Required number of leading '0' hex digits.
    pub difficulty: u32,
    /// Digest used for block hashes.
    pub algorithm: HashAlgorithm,
    /// Upper bound on nonces tried per search (None = unbounded).
    pub max_iterations: Option<u64>,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            algorithm: HashAlgorithm::default(),
            max_iterations: None,
        }
    }
}

impl PowConfig {
    /// Create a configuration with the given difficulty and default digest.
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Hash of a block given its serialized transactions.
    pub fn block_hash(&self, serialized: &str, previous_hash: &str, nonce: u64) -> String {
        self.algorithm
            .hash_hex(block_preimage(serialized, previous_hash, nonce).as_bytes())
    }

    /// Check a hash against the configured difficulty.
    pub fn meets_difficulty(&self, hash_hex: &str) -> bool {
        is_valid_pow(hash_hex, self.difficulty)
    }
}

/// Cooperative cancellation flag for a running search.
///
/// Clones share the same flag, so one clone can be handed to a timer while
/// the miner polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome {
    /// A nonce satisfying the difficulty was found.
    Mined(MinedBlock),
    /// The cancel token fired before a solution was found.
    Cancelled { attempts: u64 },
    /// The iteration budget ran out.
    Exhausted { attempts: u64 },
}

impl MiningOutcome {
    /// Get the mined block, if any.
    pub fn into_block(self) -> Option<MinedBlock> {
        match self {
            Self::Mined(block) => Some(block),
            _ => None,
        }
    }
}

/// Sequential nonce-search miner.
#[derive(Debug, Clone, Default)]
pub struct Miner {
    config: PowConfig,
}

impl Miner {
    pub fn new(config: PowConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// Seal `transactions` on top of `previous_hash`.
    ///
    /// Returns [`MiningOutcome::Cancelled`] when `cancel` fires and
    /// [`MiningOutcome::Exhausted`] when the configured iteration budget is
    /// used up. The transactions are moved into the mined block unchanged.
    pub fn mine(
        &self,
        transactions: Vec<Transaction>,
        previous_hash: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<MiningOutcome> {
        if transactions.is_empty() {
            return Err(MiningError::EmptyTransactionSet);
        }
        if self.config.difficulty as usize > HEX_DIGEST_LEN {
            return Err(MiningError::UnreachableDifficulty {
                difficulty: self.config.difficulty,
                max: HEX_DIGEST_LEN,
            });
        }

        let payload = format!("{}{}", serialize_transactions(&transactions)?, previous_hash);

        let outcome = match self.search(&payload, 0, cancel)? {
            Search::Found { nonce, hash, attempts } => {
                debug!(nonce, attempts, %hash, "proof of work found");
                MiningOutcome::Mined(MinedBlock {
                    previous_hash: previous_hash.to_string(),
                    hash,
                    nonce,
                    transactions,
                })
            }
            Search::Cancelled { attempts } => {
                debug!(attempts, "mining cancelled");
                MiningOutcome::Cancelled { attempts }
            }
            Search::Exhausted { attempts } => {
                debug!(attempts, "mining budget exhausted");
                MiningOutcome::Exhausted { attempts }
            }
        };
        Ok(outcome)
    }

    fn search(&self, payload: &str, start: u64, cancel: Option<&CancelToken>) -> Result<Search> {
        let mut nonce = start;
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Ok(Search::Cancelled { attempts });
            }
            if self
                .config
                .max_iterations
                .is_some_and(|max| attempts >= max)
            {
                return Ok(Search::Exhausted { attempts });
            }

            let nonce_str = nonce.to_string();
            let candidate = self
                .config
                .algorithm
                .hash_concat_hex(&[payload.as_bytes(), nonce_str.as_bytes()]);
            attempts = attempts.saturating_add(1);

            if self.config.meets_difficulty(&candidate) {
                return Ok(Search::Found {
                    nonce,
                    hash: candidate,
                    attempts,
                });
            }

            nonce = nonce
                .checked_add(1)
                .ok_or(MiningError::NonceOverflow { attempts })?;
        }
    }
}

enum Search {
    Found { nonce: u64, hash: String, attempts: u64 },
    Cancelled { attempts: u64 },
    Exhausted { attempts: u64 },
}
