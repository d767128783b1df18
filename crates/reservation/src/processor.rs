//! Dispatches inbound order events to the reservation workflow.

use domain::{Order, OrderStatus};
use ledger_store::LedgerStore;

use crate::applied::{AppliedOperation, AppliedOrders, ClaimOutcome};
use crate::publisher::{OrderPublisher, PublishError};
use crate::workflow::ReservationWorkflow;

/// Routes one inbound order event to the matching ledger operation.
///
/// NEW orders are answered with an ACCEPT or REJECT event; ROLLBACK and
/// CONFIRMATION are fire-and-forget, their failures logged and swallowed
/// because there is no compensating action for a failed compensation.
/// The applied-orders guard makes redelivered messages no-ops: a duplicate
/// NEW re-publishes the recorded outcome without touching the ledger, a
/// duplicate ROLLBACK/CONFIRMATION does nothing.
pub struct OrderProcessor<S, P> {
    workflow: ReservationWorkflow<S>,
    publisher: P,
    applied: AppliedOrders,
}

impl<S, P> OrderProcessor<S, P>
where
    S: LedgerStore,
    P: OrderPublisher,
{
    /// Creates a processor with a fresh applied-orders guard.
    pub fn new(workflow: ReservationWorkflow<S>, publisher: P) -> Self {
        Self::with_applied(workflow, publisher, AppliedOrders::new())
    }

    /// Creates a processor around an existing guard.
    pub fn with_applied(
        workflow: ReservationWorkflow<S>,
        publisher: P,
        applied: AppliedOrders,
    ) -> Self {
        Self {
            workflow,
            publisher,
            applied,
        }
    }

    /// Returns the redelivery guard.
    pub fn applied(&self) -> &AppliedOrders {
        &self.applied
    }

    /// Handles one inbound order event.
    ///
    /// Reservation and compensation failures never escape; the only error
    /// this returns is a failed publish on the NEW path, which the caller
    /// logs and leaves to the transport's redelivery.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn process(&self, order: Order) -> Result<(), PublishError> {
        metrics::counter!("orders_received_total").increment(1);

        let Some(status) = order.status else {
            metrics::counter!("orders_dropped_total", "reason" => "missing_status").increment(1);
            tracing::warn!("order without status, dropping");
            return Ok(());
        };

        match status {
            OrderStatus::New => self.handle_new(order).await,
            OrderStatus::Rollback => {
                self.handle_compensation(order, AppliedOperation::Rollback)
                    .await;
                Ok(())
            }
            OrderStatus::Confirmation => {
                self.handle_compensation(order, AppliedOperation::Confirm)
                    .await;
                Ok(())
            }
            OrderStatus::Accept | OrderStatus::Reject => {
                metrics::counter!("orders_dropped_total", "reason" => "outcome_status")
                    .increment(1);
                tracing::warn!(%status, "outcome status on the inbound stream, dropping");
                Ok(())
            }
        }
    }

    async fn handle_new(&self, order: Order) -> Result<(), PublishError> {
        // The claim makes check-and-apply atomic: a duplicate delivery
        // racing this one backs off instead of reserving a second time.
        let outcome = match self.applied.claim(order.id, AppliedOperation::Create) {
            ClaimOutcome::Applied(Some(recorded)) => {
                tracing::info!(outcome = %recorded, "duplicate NEW delivery, re-answering");
                recorded
            }
            ClaimOutcome::Applied(None) => return Ok(()),
            ClaimOutcome::InFlight => {
                tracing::info!("duplicate NEW delivery racing the first, dropping");
                return Ok(());
            }
            ClaimOutcome::Claimed => {
                let outcome = match self.workflow.create_reservation(&order).await {
                    Ok(()) => OrderStatus::Accept,
                    Err(e) => {
                        tracing::warn!(error = %e, "reservation refused");
                        OrderStatus::Reject
                    }
                };
                // Completed before publishing, so a redelivery after a
                // publish failure re-answers instead of re-reserving.
                self.applied
                    .complete(order.id, AppliedOperation::Create, Some(outcome));
                metrics::counter!("reservations_total", "outcome" => outcome.as_str())
                    .increment(1);
                outcome
            }
        };

        self.publisher.publish(&order.with_status(outcome)).await
    }

    async fn handle_compensation(&self, order: Order, operation: AppliedOperation) {
        match self.applied.claim(order.id, operation) {
            ClaimOutcome::Applied(_) => {
                tracing::info!(
                    operation = operation.as_str(),
                    "duplicate delivery, already applied"
                );
                return;
            }
            ClaimOutcome::InFlight => {
                tracing::info!(
                    operation = operation.as_str(),
                    "duplicate delivery racing the first, dropping"
                );
                return;
            }
            ClaimOutcome::Claimed => {}
        }

        let result = match operation {
            AppliedOperation::Rollback => self.workflow.rollback_reservation(&order).await,
            AppliedOperation::Confirm => self.workflow.confirm_reservation(&order).await,
            AppliedOperation::Create => unreachable!("NEW is handled on the publish path"),
        };

        match result {
            Ok(()) => {
                self.applied.complete(order.id, operation, None);
            }
            Err(e) => {
                // Best effort: the claim is released instead of recorded,
                // so a redelivery can try again.
                self.applied.release(order.id, operation);
                metrics::counter!("compensation_failures_total", "operation" => operation.as_str())
                    .increment(1);
                tracing::error!(
                    error = %e,
                    operation = operation.as_str(),
                    "compensation failed, dropping"
                );
            }
        }
    }
}
