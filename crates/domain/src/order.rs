//! Order wire model.
//!
//! Orders originate on the message bus and are transient: each inbound
//! event is deserialized into an [`Order`], routed by its status, and
//! dropped once handled. Only the `NEW` path produces an outbound event,
//! which reuses the same shape with the status replaced by the outcome.

use common::{CustomerId, ItemId, OrderId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Lifecycle tag carried by an order event.
///
/// `New`, `Rollback`, and `Confirmation` arrive on the inbound stream and
/// select the ledger operation. `Accept` and `Reject` are produced by this
/// system as the outcome of a `New` order; they never select an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Request to reserve stock for the order.
    New,

    /// Request to return a previous reservation to available stock.
    Rollback,

    /// Request to consume a previous reservation (stock shipped).
    Confirmation,

    /// Outcome: the reservation was made.
    Accept,

    /// Outcome: the reservation was refused.
    Reject,
}

impl OrderStatus {
    /// Returns the status as its wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Rollback => "ROLLBACK",
            OrderStatus::Confirmation => "CONFIRMATION",
            OrderStatus::Accept => "ACCEPT",
            OrderStatus::Reject => "REJECT",
        }
    }

    /// Returns true for the outcome tags this system publishes.
    pub fn is_outcome(&self) -> bool {
        matches!(self, OrderStatus::Accept | OrderStatus::Reject)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// The ledger item this line draws from.
    pub id: ItemId,

    /// Units requested.
    pub quantity: u32,

    /// Price per unit.
    pub price: Money,
}

impl Product {
    /// Creates a new product line.
    pub fn new(id: ItemId, quantity: u32, price: Money) -> Self {
        Self {
            id,
            quantity,
            price,
        }
    }

    /// Returns the total price for this line (quantity * price).
    pub fn total_price(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// An order event as it travels on the bus.
///
/// `product` and `status` are optional on the wire; events missing either
/// are handled defensively downstream rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// The order identifier, assigned by the producer.
    pub id: OrderId,

    /// The customer that placed the order.
    pub customer_id: CustomerId,

    /// The product line, if the producer supplied one.
    pub product: Option<Product>,

    /// The lifecycle tag, if the producer supplied one.
    pub status: Option<OrderStatus>,

    /// Originating system, free-form.
    pub source: Option<String>,

    /// Human-readable note, free-form.
    pub description: Option<String>,
}

impl Order {
    /// Creates a bare order with no product, status, or annotations.
    pub fn new(id: OrderId, customer_id: CustomerId) -> Self {
        Self {
            id,
            customer_id,
            product: None,
            status: None,
            source: None,
            description: None,
        }
    }

    /// Sets the product line.
    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    /// Sets the lifecycle tag.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the originating system.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
