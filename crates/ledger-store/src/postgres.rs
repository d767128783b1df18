use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

use crate::{
    Item, ItemId, ItemRecord, LedgerError, ListQuery, Result, Version, store::LedgerStore,
};

/// PostgreSQL-backed ledger store.
///
/// Each item is one row. Conditional writes compare-and-swap on the
/// `version` column so concurrent updates against a stale read fail
/// instead of clobbering each other.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs pending migrations for the items table.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn row_to_record(row: &PgRow) -> Result<ItemRecord> {
    let item = Item::new(
        ItemId::new(row.try_get("id")?),
        row.try_get::<String, _>("name")?,
        row.try_get("stock_available")?,
        row.try_get("stock_reserved")?,
    );
    Ok(ItemRecord {
        item,
        version: Version::new(row.try_get("version")?),
    })
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[tracing::instrument(skip(self, item), fields(item_id = %item.id))]
    async fn insert(&self, item: Item) -> Result<ItemRecord> {
        let record = ItemRecord::new(item);

        sqlx::query(
            r#"
            INSERT INTO items (id, name, stock_available, stock_reserved, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.item.id.as_i64())
        .bind(&record.item.name)
        .bind(record.item.stock_available)
        .bind(record.item.stock_reserved)
        .bind(record.version.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("items_pkey")
            {
                return LedgerError::AlreadyExists(record.item.id);
            }
            LedgerError::Database(e)
        })?;

        Ok(record)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, stock_available, stock_reserved, version
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    #[tracing::instrument(skip(self, record), fields(item_id = %record.item.id))]
    async fn save(&self, record: ItemRecord) -> Result<ItemRecord> {
        let row = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, stock_available = $3, stock_reserved = $4, version = version + 1
            WHERE id = $1 AND version = $5
            RETURNING version
            "#,
        )
        .bind(record.item.id.as_i64())
        .bind(&record.item.name)
        .bind(record.item.stock_available)
        .bind(record.item.stock_reserved)
        .bind(record.version.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(ItemRecord {
                version: Version::new(row.try_get("version")?),
                item: record.item,
            }),
            None => {
                // The conditional update missed: either the row is gone or
                // another writer bumped the version first.
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM items WHERE id = $1")
                        .bind(record.item.id.as_i64())
                        .fetch_optional(&self.pool)
                        .await?;
                match actual {
                    Some(actual) => Err(LedgerError::VersionConflict {
                        item_id: record.item.id,
                        expected: record.version,
                        actual: Version::new(actual),
                    }),
                    None => Err(LedgerError::NotFound(record.item.id)),
                }
            }
        }
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(id));
        }
        Ok(())
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<ItemRecord>> {
        // Sort column and direction come from a closed enum, never from
        // raw request input, so interpolating them is safe.
        let sql = format!(
            r#"
            SELECT id, name, stock_available, stock_reserved, version
            FROM items
            ORDER BY {} {}
            LIMIT $1 OFFSET $2
            "#,
            query.sort.field.as_column(),
            query.sort.direction.as_sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(query.limit as i64)
            .bind(query.offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }
}
