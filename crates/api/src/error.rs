//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ItemValidationError;
use ledger_store::{LedgerError, ParseSortError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Item field validation failure.
    Validation(ItemValidationError),
    /// Ledger store error.
    Ledger(LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Ledger(err) => ledger_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::AlreadyExists(_) | LedgerError::VersionConflict { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LedgerError::Timeout { .. } | LedgerError::Database(_) | LedgerError::Migration(_) => {
            tracing::error!(error = %err, "ledger store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ItemValidationError> for ApiError {
    fn from(err: ItemValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<ParseSortError> for ApiError {
    fn from(err: ParseSortError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
