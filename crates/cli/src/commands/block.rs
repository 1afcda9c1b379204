//! Block operations command.

use super::tx::print_transaction;
use super::{open, short_hash};
use anyhow::{Context, Result};
use chaintrack_chain::{Ledger, LedgerError, MineOutcome};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// Mine all pending transactions into a new block
    Mine {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// List recent blocks
    List {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },
    /// Show detailed block information
    Info {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block id
        block_id: u64,
    },
    /// Overwrite a transaction amount inside a block (breaks validation)
    Tamper {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block id
        block_id: u64,

        /// New amount
        amount: f64,

        /// Transaction to modify (defaults to the block's first)
        #[arg(short, long)]
        transaction: Option<Uuid>,
    },
}

pub fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::Mine { data_dir } => mine_block(data_dir),
        BlockCommand::List { data_dir, count } => list_blocks(data_dir, count),
        BlockCommand::Info { data_dir, block_id } => show_block_info(data_dir, block_id),
        BlockCommand::Tamper {
            data_dir,
            block_id,
            amount,
            transaction,
        } => tamper_block(data_dir, block_id, amount, transaction),
    }
}

fn mine_block(data_dir: PathBuf) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);

    let pending = ledger.pending_transactions()?.len();
    println!("{}", "Mining new block...".bold().cyan());
    println!();
    println!("  Pending:    {}", pending.to_string().bright_cyan());
    println!(
        "  Difficulty: {}",
        config.pow.difficulty.to_string().bright_cyan()
    );

    let started = Instant::now();
    let block = match ledger.mine_block(None) {
        Ok(MineOutcome::Mined(block)) => block,
        Ok(MineOutcome::Cancelled { attempts }) | Ok(MineOutcome::Exhausted { attempts }) => {
            println!();
            println!(
                "{}  Gave up after {} attempts; nothing was stored",
                "✗".red().bold(),
                attempts
            );
            return Ok(());
        }
        Err(LedgerError::NothingToMine) => {
            println!();
            println!("{}", "No transactions to mine".yellow());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to mine block"),
    };
    storage.flush()?;

    println!();
    println!("{}  Block mined", "✓".green().bold());
    println!("    ID:     {}", block.id.to_string().bright_cyan());
    println!("    Hash:   {}", block.hash.bright_yellow());
    println!("    Nonce:  {}", block.nonce.to_string().bright_cyan());
    println!("    Txs:    {}", block.tx_count().to_string().bright_cyan());
    println!(
        "    Time:   {}",
        format!("{:.2?}", started.elapsed()).bright_black()
    );
    println!();

    Ok(())
}

fn list_blocks(data_dir: PathBuf, count: usize) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);
    let blocks = ledger.blocks()?;

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    if blocks.is_empty() {
        println!("  {}", "(none)".bright_black());
    }
    for block in blocks.iter().rev().take(count) {
        println!(
            "  {} {} {}",
            format!("#{}", block.id).bright_black(),
            short_hash(&block.hash, 16).bright_yellow(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }

    println!();
    Ok(())
}

fn show_block_info(data_dir: PathBuf, block_id: u64) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);
    let block = ledger.get_block(block_id)?.context("Block not found")?;

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  ID:           {}", block.id.to_string().bright_cyan());
    println!("  Hash:         {}", block.hash.bright_yellow());
    println!(
        "  Parent Hash:  {}",
        short_hash(&block.previous_hash, 64).bright_black()
    );
    println!("  Nonce:        {}", block.nonce.to_string().bright_black());
    println!(
        "  Timestamp:    {}",
        block.timestamp.to_rfc3339().bright_black()
    );
    println!(
        "  Transactions: {}",
        block.tx_count().to_string().bright_cyan()
    );
    println!();

    if !block.transactions.is_empty() {
        println!("{}", "Transactions:".bold());
        println!();
        for tx in &block.transactions {
            print_transaction(tx);
        }
        println!();
    }

    Ok(())
}

fn tamper_block(
    data_dir: PathBuf,
    block_id: u64,
    amount: f64,
    transaction: Option<Uuid>,
) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);

    let tx = ledger
        .tamper(block_id, transaction, amount)
        .context("Failed to modify block")?;
    storage.flush()?;

    println!("{}  Transaction modified", "!".yellow().bold());
    print_transaction(&tx);
    println!();
    println!(
        "Run {} to see the broken block.",
        "chaintrack validate".bright_yellow()
    );

    Ok(())
}
