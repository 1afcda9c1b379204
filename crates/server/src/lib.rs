//! HTTP API for the chaintrack ledger.
//!
//! | Method | Path                      | Purpose                               |
//! |--------|---------------------------|---------------------------------------|
//! | POST   | `/transaction`            | submit a transaction                  |
//! | GET    | `/transactions`           | list all transactions                 |
//! | GET    | `/transactions/:block_id` | transactions of one block             |
//! | POST   | `/mine`                   | mine pending transactions into a block|
//! | GET    | `/blocks`                 | list blocks, newest first             |
//! | GET    | `/block/:id`              | fetch one block                       |
//! | POST   | `/block/:id`              | overwrite a transaction amount        |
//! | GET    | `/validate`               | verify every stored block             |
//! | GET    | `/stats`                  | ledger statistics                     |

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use config::ServerArgs;
pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transaction", post(api::submit_transaction))
        .route("/transactions", get(api::list_transactions))
        .route("/transactions/:block_id", get(api::block_transactions))
        .route("/mine", post(api::mine))
        .route("/blocks", get(api::list_blocks))
        .route("/block/:id", get(api::get_block).post(api::tamper_block))
        .route("/validate", get(api::validate))
        .route("/stats", get(api::stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
