//! Outcome publisher trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use thiserror::Error;

/// Failure to hand an order outcome to the outbound channel.
#[derive(Debug, Error)]
#[error("Failed to publish order {order_id}: {reason}")]
pub struct PublishError {
    /// The order that could not be published.
    pub order_id: OrderId,
    /// Reason reported by the transport.
    pub reason: String,
}

/// Trait for publishing order outcomes to the outbound stream.
#[async_trait]
pub trait OrderPublisher: Send + Sync {
    /// Publishes one order outcome.
    async fn publish(&self, order: &Order) -> Result<(), PublishError>;
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<Order>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryOrderPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail on the next publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns all published orders in publish order.
    pub fn published(&self) -> Vec<Order> {
        self.state.read().unwrap().published.clone()
    }

    /// Returns the number of published orders.
    pub fn published_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }

    /// Returns the most recently published order, if any.
    pub fn last_published(&self) -> Option<Order> {
        self.state.read().unwrap().published.last().cloned()
    }
}

#[async_trait]
impl OrderPublisher for InMemoryOrderPublisher {
    async fn publish(&self, order: &Order) -> Result<(), PublishError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_publish {
            return Err(PublishError {
                order_id: order.id,
                reason: "Publisher unavailable".to_string(),
            });
        }

        state.published.push(order.clone());
        Ok(())
    }
}
