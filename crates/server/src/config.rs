//! Command-line and environment configuration for the server.

use chaintrack_chain::{ConfigError, LedgerConfig};
use chaintrack_core::HashAlgorithm;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "chaintrack-server")]
#[command(about = "HTTP API for the chaintrack ledger", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "CHAINTRACK_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory holding the ledger database and config.json
    #[arg(short, long, env = "CHAINTRACK_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Leading zero hex digits required of block hashes (overrides config.json)
    #[arg(long, env = "CHAINTRACK_DIFFICULTY")]
    pub difficulty: Option<u32>,

    /// Hash algorithm: sha256 or blake3 (overrides config.json)
    #[arg(long, env = "CHAINTRACK_HASH")]
    pub hash: Option<HashAlgorithm>,

    /// Also check previous-hash links during validation
    #[arg(long, env = "CHAINTRACK_STRICT_LINKAGE")]
    pub strict_linkage: bool,

    /// Abort a mining request after this many seconds (0 disables the limit)
    #[arg(long, env = "CHAINTRACK_MINE_TIMEOUT_SECS", default_value = "30")]
    pub mine_timeout_secs: u64,
}

impl ServerArgs {
    /// Ledger configuration: `config.json` from the data directory with
    /// command-line overrides applied.
    pub fn ledger_config(&self) -> Result<LedgerConfig, ConfigError> {
        let mut config = LedgerConfig::load_or_default(&self.data_dir)?;
        if let Some(difficulty) = self.difficulty {
            config.pow.difficulty = difficulty;
        }
        if let Some(algorithm) = self.hash {
            config.pow.algorithm = algorithm;
        }
        if self.strict_linkage {
            config.strict_linkage = true;
        }
        Ok(config)
    }

    pub fn mine_timeout(&self) -> Option<Duration> {
        (self.mine_timeout_secs > 0).then(|| Duration::from_secs(self.mine_timeout_secs))
    }
}
