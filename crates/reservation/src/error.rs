//! Reservation error types.

use common::ItemId;
use domain::StockError;
use ledger_store::LedgerError;
use thiserror::Error;

/// Errors that can occur while applying an order to the stock ledger.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The ordered item does not exist in the ledger.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The order failed a stock check.
    #[error("Stock check failed: {0}")]
    Stock(#[from] StockError),

    /// Ledger store error.
    #[error("Ledger store error: {0}")]
    Store(#[from] LedgerError),
}

/// Convenience type alias for reservation results.
pub type Result<T> = std::result::Result<T, ReservationError>;
