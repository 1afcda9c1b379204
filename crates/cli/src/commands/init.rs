//! Initialize data directory command.

use anyhow::{bail, Context, Result};
use chaintrack_chain::LedgerConfig;
use chaintrack_consensus::PowConfig;
use chaintrack_core::HashAlgorithm;
use chaintrack_storage::Storage;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Leading zero hex digits required of block hashes
    #[arg(long, default_value = "4")]
    difficulty: u32,

    /// Hash algorithm (sha256 or blake3)
    #[arg(long, default_value = "sha256")]
    hash: HashAlgorithm,

    /// Give up mining after this many nonces
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Also check previous-hash links during validation
    #[arg(long)]
    strict_linkage: bool,

    /// Overwrite an existing config.json
    #[arg(short, long)]
    force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing chaintrack...".bold().cyan());
    println!();

    let config_file = LedgerConfig::path(&args.data_dir);
    if config_file.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            config_file.display()
        );
    }

    // Create data directory
    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;

    // Open storage so the database exists before the first command
    let storage = Storage::open(&args.data_dir).with_context(|| "Failed to open storage")?;
    storage.flush()?;

    println!("{}  Created data directory", "✓".green().bold());

    let mut pow = PowConfig::new(args.difficulty).with_algorithm(args.hash);
    if let Some(limit) = args.max_iterations {
        pow = pow.with_max_iterations(limit);
    }
    let config = LedgerConfig {
        pow,
        strict_linkage: args.strict_linkage,
    };
    config.save(&args.data_dir)?;

    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        config_file.display().to_string().bright_black()
    );
    println!();
    println!("  Difficulty:     {}", args.difficulty.to_string().bright_cyan());
    println!("  Hash:           {}", args.hash.to_string().bright_cyan());
    println!(
        "  Strict linkage: {}",
        args.strict_linkage.to_string().bright_cyan()
    );
    println!();
    println!(
        "Submit a transaction with {}",
        "chaintrack tx send <SENDER> <RECEIVER> <AMOUNT>".bright_yellow()
    );

    Ok(())
}
