use anyhow::{Context, Result};
use chaintrack_server::{router, AppState, ServerArgs};
use chaintrack_storage::Storage;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = ServerArgs::parse();
    let config = args
        .ledger_config()
        .context("Failed to load ledger config")?;

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create {}", args.data_dir.display()))?;
    let storage = Storage::open(&args.data_dir).context("Failed to open ledger database")?;

    let difficulty = config.pow.difficulty;
    let algorithm = config.pow.algorithm;
    let state = AppState::new(storage, config, args.mine_timeout());
    let storage = state.storage.clone();

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(address = %args.listen, difficulty, %algorithm, "chaintrack server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    storage.flush().context("Failed to flush ledger database")?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
