//! Stock reservation workflow for incoming orders.
//!
//! This crate turns order messages into stock ledger updates:
//! 1. A NEW order reserves stock and is answered with ACCEPT or REJECT.
//! 2. A ROLLBACK returns a reservation to available stock.
//! 3. A CONFIRMATION burns a reservation out of the ledger.
//!
//! Updates run under optimistic locking with bounded retries, and a
//! redelivery guard keeps reprocessed messages from adjusting stock twice.

pub mod applied;
pub mod consumer;
pub mod error;
pub mod processor;
pub mod publisher;
pub mod workflow;

pub use applied::{AppliedOperation, AppliedOrders, ClaimOutcome};
pub use consumer::ConsumerPool;
pub use error::ReservationError;
pub use processor::OrderProcessor;
pub use publisher::{InMemoryOrderPublisher, OrderPublisher, PublishError};
pub use workflow::{ReservationWorkflow, WorkflowOptions};
