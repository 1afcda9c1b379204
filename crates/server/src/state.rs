use chaintrack_chain::LedgerConfig;
use chaintrack_storage::Storage;
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub config: Arc<LedgerConfig>,
    /// Cancel mining requests that run longer than this.
    pub mine_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(storage: Storage, config: LedgerConfig, mine_timeout: Option<Duration>) -> Self {
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
            mine_timeout,
        }
    }
}
