//! Domain layer for the stock reservation system.
//!
//! This crate provides the core data model and business rules:
//! - Item ledger entry with per-field validation
//! - Order, Product, and OrderStatus wire model
//! - Pure stock validation for the reservation workflow
//!
//! Everything here is synchronous and side-effect free; persistence and
//! messaging live in the `ledger-store` and `reservation` crates.

pub mod item;
pub mod money;
pub mod order;
pub mod stock;

pub use common::{CustomerId, ItemId, OrderId};
pub use item::{Item, ItemValidationError};
pub use money::Money;
pub use order::{Order, OrderStatus, Product};
pub use stock::{StockError, validate_confirm, validate_create, validate_rollback};
