//! Chain validation command.

use super::{open, short_hash};
use anyhow::{bail, Result};
use chaintrack_chain::Ledger;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ValidateArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let (storage, config) = open(&args.data_dir)?;
    let ledger = Ledger::new(&storage, &config);
    let report = ledger.validate_chain()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_valid() {
        println!(
            "{}  Blockchain is valid ({} blocks)",
            "✓".green().bold(),
            report.blocks_checked
        );
    } else {
        println!("{}  Blockchain is invalid", "✗".red().bold());
        println!();
        for violation in &report.violations {
            println!(
                "  {} {:?}",
                format!("#{}", violation.block_id).bright_black(),
                violation.kind
            );
            println!(
                "    stored:   {}",
                short_hash(&violation.stored_hash, 64).bright_yellow()
            );
            println!(
                "    expected: {}",
                short_hash(&violation.expected_hash, 64).bright_yellow()
            );
        }
        println!();
    }

    if !report.is_valid() {
        bail!("{} invalid block(s)", report.violations.len());
    }
    Ok(())
}
