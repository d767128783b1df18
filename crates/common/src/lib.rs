//! Shared identifier types used across the stock reservation workspace.

pub mod types;

pub use types::{CustomerId, ItemId, OrderId};
