use async_trait::async_trait;

use crate::{Item, ItemId, ItemRecord, ListQuery, Result};

/// Core trait for ledger store implementations.
///
/// A ledger store holds one record per item and guards every update with
/// a version check. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new entry at the initial version.
    ///
    /// Fails with `AlreadyExists` if the identifier is taken.
    async fn insert(&self, item: Item) -> Result<ItemRecord>;

    /// Retrieves an entry with its current version.
    ///
    /// Returns None if the item doesn't exist.
    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Writes an entry back, conditional on its version.
    ///
    /// The record's version must match the stored one; the write bumps it
    /// by one and the updated record is returned. Fails with
    /// `VersionConflict` if another writer committed in between, or with
    /// `NotFound` if the entry was deleted.
    async fn save(&self, record: ItemRecord) -> Result<ItemRecord>;

    /// Removes an entry.
    ///
    /// Fails with `NotFound` if the item doesn't exist.
    async fn delete(&self, id: ItemId) -> Result<()>;

    /// Lists entries according to the query's paging and ordering.
    async fn list(&self, query: ListQuery) -> Result<Vec<ItemRecord>>;
}
