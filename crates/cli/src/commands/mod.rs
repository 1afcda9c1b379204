//! CLI commands module.

use anyhow::{Context, Result};
use chaintrack_chain::LedgerConfig;
use chaintrack_storage::Storage;
use clap::Subcommand;
use std::path::Path;

mod block;
mod init;
mod tx;
mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a data directory
    Init(init::InitArgs),
    /// Transaction operations
    Tx(tx::TxArgs),
    /// Block operations
    Block(block::BlockArgs),
    /// Verify every stored block
    Validate(validate::ValidateArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Tx(args) => tx::run(args),
        Commands::Block(args) => block::run(args),
        Commands::Validate(args) => validate::run(args),
    }
}

/// Open the database and config of an initialized data directory.
pub(crate) fn open(data_dir: &Path) -> Result<(Storage, LedgerConfig)> {
    let config = LedgerConfig::load(data_dir).with_context(|| {
        format!(
            "Failed to read {}. Did you run 'chaintrack init'?",
            LedgerConfig::path(data_dir).display()
        )
    })?;
    let storage = Storage::open(data_dir)
        .with_context(|| "Failed to open storage. Did you run 'chaintrack init'?")?;
    Ok((storage, config))
}

/// First `len` characters of a hash, or `(none)` when empty.
pub(crate) fn short_hash(hash: &str, len: usize) -> &str {
    if hash.is_empty() {
        "(none)"
    } else {
        &hash[..hash.len().min(len)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("", 8), "(none)");
        assert_eq!(short_hash("00ab", 8), "00ab");
        assert_eq!(short_hash("00abcdef0123", 8), "00abcdef");
    }

    #[test]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open(dir.path()).is_err());

        LedgerConfig::default().save(dir.path()).unwrap();
        assert!(open(dir.path()).is_ok());
    }
}
