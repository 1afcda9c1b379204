//! Request handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chaintrack_chain::{Ledger, LedgerError, MineOutcome};
use chaintrack_consensus::CancelToken;
use chaintrack_core::NewTransaction;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Body of `POST /block/:id`.
#[derive(Debug, Deserialize)]
pub struct TamperRequest {
    pub amount: f64,
    #[serde(default)]
    pub transaction_id: Option<Uuid>,
}

/// Run `f` against a ledger on the blocking pool.
async fn with_ledger<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Ledger<'_>) -> Result<T, LedgerError> + Send + 'static,
{
    let storage = state.storage.clone();
    let config = state.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let ledger = Ledger::new(&storage, &config);
        f(&ledger)
    })
    .await?;
    Ok(result?)
}

pub async fn submit_transaction(
    State(state): State<AppState>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(format!("Invalid input: {e}")))?;
    let tx = with_ledger(&state, move |ledger| ledger.submit_transaction(request)).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let txs = with_ledger(&state, |ledger| ledger.transactions()).await?;
    Ok(Json(txs))
}

pub async fn block_transactions(
    State(state): State<AppState>,
    Path(block_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let txs = with_ledger(&state, move |ledger| ledger.transactions_for_block(block_id)).await?;
    Ok(Json(txs))
}

pub async fn mine(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let token = CancelToken::new();

    let timer = state.mine_timeout.map(|timeout| {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel();
        })
    });

    let outcome = with_ledger(&state, move |ledger| ledger.mine_block(Some(&token))).await;
    if let Some(timer) = timer {
        timer.abort();
    }

    match outcome? {
        MineOutcome::Mined(block) => {
            info!(id = block.id, hash = %block.hash, "block mined via api");
            Ok((StatusCode::CREATED, Json(block)))
        }
        MineOutcome::Cancelled { attempts } => {
            warn!(attempts, "mining timed out");
            Err(ApiError::Unavailable(format!(
                "Mining timed out after {attempts} attempts"
            )))
        }
        MineOutcome::Exhausted { attempts } => Err(ApiError::Unavailable(format!(
            "Mining gave up after {attempts} attempts"
        ))),
    }
}

pub async fn list_blocks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let mut blocks = with_ledger(&state, |ledger| ledger.blocks()).await?;
    blocks.reverse();
    Ok(Json(blocks))
}

pub async fn get_block(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    with_ledger(&state, move |ledger| ledger.get_block(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Block not found".into()))
}

pub async fn tamper_block(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<TamperRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(format!("Invalid input: {e}")))?;
    if !request.amount.is_finite() {
        return Err(ApiError::BadRequest("Amount must be a finite number".into()));
    }
    let tx = with_ledger(&state, move |ledger| {
        ledger.tamper(id, request.transaction_id, request.amount)
    })
    .await?;
    Ok(Json(tx))
}

pub async fn validate(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = with_ledger(&state, |ledger| ledger.validate_chain()).await?;
    if report.is_valid() {
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Blockchain is valid" })),
        ))
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Blockchain is invalid",
                "invalid_blocks": report.violations,
            })),
        ))
    }
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = with_ledger(&state, |ledger| ledger.stats()).await?;
    Ok(Json(stats))
}
