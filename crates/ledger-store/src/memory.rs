use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Item, ItemId, ItemRecord, LedgerError, ListQuery, Result, SortDirection, SortField,
    store::LedgerStore,
};

/// In-memory ledger store.
///
/// Stores all entries in a map behind an async lock and provides the same
/// conditional-write contract as the PostgreSQL implementation: the
/// version check and the write happen under one write-lock acquisition.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    items: Arc<RwLock<HashMap<ItemId, ItemRecord>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }

    /// Clears all entries.
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert(&self, item: Item) -> Result<ItemRecord> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(LedgerError::AlreadyExists(item.id));
        }
        let record = ItemRecord::new(item);
        items.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let items = self.items.read().await;
        Ok(items.get(&id).cloned())
    }

    async fn save(&self, record: ItemRecord) -> Result<ItemRecord> {
        let mut items = self.items.write().await;
        let id = record.id();

        let Some(current) = items.get(&id) else {
            return Err(LedgerError::NotFound(id));
        };
        if current.version != record.version {
            return Err(LedgerError::VersionConflict {
                item_id: id,
                expected: record.version,
                actual: current.version,
            });
        }

        let updated = ItemRecord {
            version: record.version.next(),
            item: record.item,
        };
        items.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let mut items = self.items.write().await;
        if items.remove(&id).is_none() {
            return Err(LedgerError::NotFound(id));
        }
        Ok(())
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<ItemRecord>> {
        let items = self.items.read().await;
        let mut records: Vec<ItemRecord> = items.values().cloned().collect();

        records.sort_by(|a, b| {
            let ordering = match query.sort.field {
                SortField::Id => a.item.id.cmp(&b.item.id),
                SortField::Name => a.item.name.cmp(&b.item.name),
                SortField::StockAvailable => a.item.stock_available.cmp(&b.item.stock_available),
                SortField::StockReserved => a.item.stock_reserved.cmp(&b.item.stock_reserved),
            };
            match query.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}
