//! Pure stock validation for the reservation workflow.
//!
//! Each function checks one ledger operation against the current entry and
//! returns the quantity to apply. Nothing here mutates state, so the checks
//! can run concurrently and be retried freely; the workflow decides what a
//! failure means for the order.

use common::{ItemId, OrderId};
use thiserror::Error;

use crate::item::Item;
use crate::order::Order;

/// Business-rule violations detected while checking an order against a
/// ledger entry.
#[derive(Debug, Error)]
pub enum StockError {
    /// The order carries no product line to act on.
    #[error("Order {0} has no product line")]
    MissingProduct(OrderId),

    /// The order asks for more units than are free to promise.
    #[error(
        "Insufficient available stock for item {item_id}: requested {requested}, available {available}"
    )]
    InsufficientAvailable {
        item_id: ItemId,
        requested: u32,
        available: i64,
    },

    /// The order refers to more reserved units than the ledger holds.
    #[error(
        "Insufficient reserved stock for item {item_id}: requested {requested}, reserved {reserved}"
    )]
    InsufficientReserved {
        item_id: ItemId,
        requested: u32,
        reserved: i64,
    },
}

/// Checks that a new reservation fits within the available balance.
pub fn validate_create(item: &Item, order: &Order) -> Result<u32, StockError> {
    let quantity = requested_quantity(order)?;
    if item.stock_available < quantity as i64 {
        return Err(StockError::InsufficientAvailable {
            item_id: item.id,
            requested: quantity,
            available: item.stock_available,
        });
    }
    Ok(quantity)
}

/// Checks that a rollback refers to no more than the reserved balance.
pub fn validate_rollback(item: &Item, order: &Order) -> Result<u32, StockError> {
    let quantity = requested_quantity(order)?;
    if item.stock_reserved < quantity as i64 {
        return Err(StockError::InsufficientReserved {
            item_id: item.id,
            requested: quantity,
            reserved: item.stock_reserved,
        });
    }
    Ok(quantity)
}

/// Checks that a confirmation refers to no more than the reserved balance.
pub fn validate_confirm(item: &Item, order: &Order) -> Result<u32, StockError> {
    let quantity = requested_quantity(order)?;
    if item.stock_reserved < quantity as i64 {
        return Err(StockError::InsufficientReserved {
            item_id: item.id,
            requested: quantity,
            reserved: item.stock_reserved,
        });
    }
    Ok(quantity)
}

fn requested_quantity(order: &Order) -> Result<u32, StockError> {
    order
        .product
        .as_ref()
        .map(|product| product.quantity)
        .ok_or(StockError::MissingProduct(order.id))
}

#[cfg(test)]
mod tests {
    use common::CustomerId;

    use super::*;
    use crate::money::Money;
    use crate::order::{OrderStatus, Product};

    fn item(available: i64, reserved: i64) -> Item {
        Item::new(ItemId::new(1), "Widget", available, reserved)
    }

    fn order(quantity: u32) -> Order {
        Order::new(OrderId::new(), CustomerId::new(7))
            .with_product(Product::new(ItemId::new(1), quantity, Money::from_cents(100)))
            .with_status(OrderStatus::New)
    }

    #[test]
    fn test_create_within_available_returns_quantity() {
        assert_eq!(validate_create(&item(100, 0), &order(30)).unwrap(), 30);
    }

    #[test]
    fn test_create_allows_exactly_available() {
        assert_eq!(validate_create(&item(30, 0), &order(30)).unwrap(), 30);
    }

    #[test]
    fn test_create_rejects_more_than_available() {
        let result = validate_create(&item(100, 0), &order(150));
        assert!(matches!(
            result,
            Err(StockError::InsufficientAvailable {
                requested: 150,
                available: 100,
                ..
            })
        ));
    }

    #[test]
    fn test_rollback_rejects_more_than_reserved() {
        let result = validate_rollback(&item(70, 30), &order(31));
        assert!(matches!(
            result,
            Err(StockError::InsufficientReserved {
                requested: 31,
                reserved: 30,
                ..
            })
        ));
    }

    #[test]
    fn test_rollback_allows_exactly_reserved() {
        assert_eq!(validate_rollback(&item(70, 30), &order(30)).unwrap(), 30);
    }

    #[test]
    fn test_confirm_rejects_more_than_reserved() {
        let result = validate_confirm(&item(70, 0), &order(1));
        assert!(matches!(
            result,
            Err(StockError::InsufficientReserved { .. })
        ));
    }

    #[test]
    fn test_missing_product_fails_every_check() {
        let bare = Order::new(OrderId::new(), CustomerId::new(7)).with_status(OrderStatus::New);
        assert!(matches!(
            validate_create(&item(100, 0), &bare),
            Err(StockError::MissingProduct(_))
        ));
        assert!(matches!(
            validate_rollback(&item(100, 0), &bare),
            Err(StockError::MissingProduct(_))
        ));
        assert!(matches!(
            validate_confirm(&item(100, 0), &bare),
            Err(StockError::MissingProduct(_))
        ));
    }

    #[test]
    fn test_validators_do_not_mutate_the_entry() {
        let before = item(100, 20);
        let checked = before.clone();
        let _ = validate_create(&checked, &order(30));
        let _ = validate_rollback(&checked, &order(10));
        let _ = validate_confirm(&checked, &order(10));
        assert_eq!(checked, before);
    }
}
