//! Mapping of ledger errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chaintrack_chain::LedgerError;
use chaintrack_storage::StorageError;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ledger(err) => match err {
                LedgerError::InvalidTransaction(_)
                | LedgerError::NothingToMine
                | LedgerError::EmptyBlock(_) => StatusCode::BAD_REQUEST,
                LedgerError::BlockNotFound(_)
                | LedgerError::TransactionNotInBlock { .. }
                | LedgerError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
                LedgerError::Storage(StorageError::AlreadyMined { .. })
                | LedgerError::Storage(StorageError::DuplicateTransaction(_)) => {
                    StatusCode::CONFLICT
                }
                LedgerError::Mining(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Ledger(LedgerError::InvalidTransaction(errors)) => {
                let fields: BTreeMap<&str, String> = errors
                    .iter()
                    .map(|e| (e.field(), e.to_string()))
                    .collect();
                json!({ "error": "Validation failed", "fields": fields })
            }
            Self::Ledger(LedgerError::NothingToMine) => {
                json!({ "error": "No transactions to mine" })
            }
            other => json!({ "error": other.to_string() }),
        };

        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintrack_consensus::{MiningError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (LedgerError::NothingToMine.into(), StatusCode::BAD_REQUEST),
            (LedgerError::BlockNotFound(3).into(), StatusCode::NOT_FOUND),
            (
                LedgerError::InvalidTransaction(vec![ValidationError::MissingSender]).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::Mining(MiningError::EmptyTransactionSet).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::Storage(StorageError::AlreadyMined {
                    id: uuid::Uuid::new_v4(),
                    block_id: Some(1),
                })
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::Mining(MiningError::NonceOverflow { attempts: 1 }).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }
}
