//! chaintrack CLI entry point.

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "chaintrack")]
#[command(about = "A proof-of-work transaction ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("chaintrack - A proof-of-work transaction ledger");
            println!("Run 'chaintrack --help' for usage information.");
        }
    }
}
