use std::time::Duration;

use thiserror::Error;

use crate::{ItemId, Version};

/// Errors that can occur when interacting with the ledger store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The item was not found in the store.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// An item with this identifier already exists.
    #[error("Item already exists: {0}")]
    AlreadyExists(ItemId),

    /// A conditional write lost against a concurrent writer.
    /// The expected version did not match the stored version.
    #[error("Version conflict for item {item_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        item_id: ItemId,
        expected: Version,
        actual: Version,
    },

    /// A store operation did not complete within its deadline.
    #[error("Store operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger store operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
