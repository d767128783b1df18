//! The reservation workflow: read, validate, mutate, conditional write.

use std::time::Duration;

use domain::{Order, validate_confirm, validate_create, validate_rollback};
use ledger_store::{ItemId, ItemRecord, LedgerError, LedgerStore};
use tokio::time::timeout;

use crate::applied::AppliedOperation;
use crate::error::{ReservationError, Result};

/// Tuning knobs for the workflow.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Deadline for each individual store call.
    pub store_timeout: Duration,

    /// How many read-validate-write attempts to make before giving up
    /// on a contended entry. Each retry implies another writer committed
    /// in between, so the budget only trips under heavy contention.
    pub max_attempts: u32,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            max_attempts: 8,
        }
    }
}

/// Applies order operations to the stock ledger.
///
/// Every operation is a read-validate-mutate-write sequence against the
/// entry named by the order's product. The write is conditional on the
/// version the entry was read at; when it loses against a concurrent
/// writer the whole sequence is retried against the fresh state, so a
/// stale validation can never commit.
pub struct ReservationWorkflow<S> {
    store: S,
    options: WorkflowOptions,
}

impl<S: LedgerStore> ReservationWorkflow<S> {
    /// Creates a workflow with default options.
    pub fn new(store: S) -> Self {
        Self::with_options(store, WorkflowOptions::default())
    }

    /// Creates a workflow with explicit options.
    pub fn with_options(store: S, options: WorkflowOptions) -> Self {
        Self { store, options }
    }

    /// Reserves stock for a NEW order: available -= qty, reserved += qty.
    ///
    /// Failure here is an expected business outcome; the dispatcher turns
    /// it into a REJECT answer rather than a pipeline error.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn create_reservation(&self, order: &Order) -> Result<()> {
        self.apply(order, AppliedOperation::Create).await
    }

    /// Returns a reservation to available stock: reserved -= qty,
    /// available += qty.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn rollback_reservation(&self, order: &Order) -> Result<()> {
        self.apply(order, AppliedOperation::Rollback).await
    }

    /// Consumes a reservation: reserved -= qty. The stock is spent, so
    /// the total owned shrinks; available is untouched.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn confirm_reservation(&self, order: &Order) -> Result<()> {
        self.apply(order, AppliedOperation::Confirm).await
    }

    async fn apply(&self, order: &Order, operation: AppliedOperation) -> Result<()> {
        let item_id = order
            .product
            .as_ref()
            .map(|product| product.id)
            .ok_or(domain::StockError::MissingProduct(order.id))?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut record = self.find(item_id).await?;
            let quantity = match operation {
                AppliedOperation::Create => validate_create(&record.item, order)?,
                AppliedOperation::Rollback => validate_rollback(&record.item, order)?,
                AppliedOperation::Confirm => validate_confirm(&record.item, order)?,
            };
            match operation {
                AppliedOperation::Create => record.item.reserve(quantity),
                AppliedOperation::Rollback => record.item.release(quantity),
                AppliedOperation::Confirm => record.item.confirm(quantity),
            }

            match self.save(record).await {
                Ok(saved) => {
                    metrics::counter!("ledger_mutations_total", "operation" => operation.as_str())
                        .increment(1);
                    tracing::info!(
                        %item_id,
                        operation = operation.as_str(),
                        quantity,
                        stock_available = saved.item.stock_available,
                        stock_reserved = saved.item.stock_reserved,
                        attempt,
                        "ledger updated"
                    );
                    return Ok(());
                }
                Err(ReservationError::Store(LedgerError::VersionConflict { .. }))
                    if attempt < self.options.max_attempts =>
                {
                    metrics::counter!("ledger_write_conflicts_total").increment(1);
                    tracing::debug!(%item_id, attempt, "conditional write lost, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn find(&self, item_id: ItemId) -> Result<ItemRecord> {
        let record = timeout(self.options.store_timeout, self.store.find_by_id(item_id))
            .await
            .map_err(|_| LedgerError::Timeout {
                operation: "find_by_id",
                timeout: self.options.store_timeout,
            })??;
        record.ok_or(ReservationError::ItemNotFound(item_id))
    }

    async fn save(&self, record: ItemRecord) -> Result<ItemRecord> {
        let saved = timeout(self.options.store_timeout, self.store.save(record))
            .await
            .map_err(|_| LedgerError::Timeout {
                operation: "save",
                timeout: self.options.store_timeout,
            })??;
        Ok(saved)
    }
}
