//! Transaction commands.

use super::open;
use anyhow::{bail, Result};
use chaintrack_chain::{Ledger, LedgerError};
use chaintrack_core::{NewTransaction, Transaction};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Submit a new transaction
    Send {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Sending party
        sender: String,

        /// Receiving party
        receiver: String,

        /// Amount to transfer
        amount: f64,
    },
    /// List transactions
    List {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Only show transactions waiting for a block
        #[arg(short, long)]
        pending: bool,

        /// Only show transactions of this block
        #[arg(short, long, conflicts_with = "pending")]
        block: Option<u64>,
    },
}

pub fn run(args: TxArgs) -> Result<()> {
    match args.command {
        TxCommand::Send {
            data_dir,
            sender,
            receiver,
            amount,
        } => send(data_dir, sender, receiver, amount),
        TxCommand::List {
            data_dir,
            pending,
            block,
        } => list(data_dir, pending, block),
    }
}

fn send(data_dir: PathBuf, sender: String, receiver: String, amount: f64) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);

    let tx = match ledger.submit_transaction(NewTransaction::new(sender, receiver, amount)) {
        Ok(tx) => tx,
        Err(LedgerError::InvalidTransaction(errors)) => {
            println!("{}", "Validation failed:".bold().red());
            for err in &errors {
                println!("  {}: {}", err.field().bright_yellow(), err);
            }
            bail!("transaction rejected");
        }
        Err(e) => return Err(e.into()),
    };
    storage.flush()?;

    println!("{}  Transaction submitted", "✓".green().bold());
    println!("    ID:     {}", tx.id.to_string().bright_yellow());
    println!("    From:   {}", tx.sender);
    println!("    To:     {}", tx.receiver);
    println!("    Amount: {}", format!("{:.2}", tx.amount).bright_cyan());

    Ok(())
}

fn list(data_dir: PathBuf, pending: bool, block: Option<u64>) -> Result<()> {
    let (storage, config) = open(&data_dir)?;
    let ledger = Ledger::new(&storage, &config);

    let (title, txs) = match block {
        Some(id) => (
            format!("Transactions in block #{}:", id),
            ledger.transactions_for_block(id)?,
        ),
        None if pending => ("Pending Transactions:".to_string(), ledger.pending_transactions()?),
        None => ("Transactions:".to_string(), ledger.transactions()?),
    };

    println!();
    println!("{}", title.bold().cyan());
    println!();

    if txs.is_empty() {
        println!("  {}", "(none)".bright_black());
    }
    for tx in &txs {
        print_transaction(tx);
    }

    println!();
    Ok(())
}

pub(crate) fn print_transaction(tx: &Transaction) {
    let status = match tx.block_id {
        Some(id) => format!("block #{}", id).green(),
        None => "pending".yellow(),
    };
    println!(
        "  {} {} -> {} {} {}",
        tx.id.to_string()[..8].bright_yellow(),
        tx.sender,
        tx.receiver,
        format!("{:.2}", tx.amount).bright_cyan(),
        format!("({})", status).bright_black()
    );
}
