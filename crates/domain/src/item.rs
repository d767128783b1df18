//! Stock ledger entry.

use common::ItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field-level validation errors for a ledger entry.
#[derive(Debug, Error)]
pub enum ItemValidationError {
    /// The item name is empty or whitespace.
    #[error("Item name must not be empty")]
    NameRequired,

    /// Available stock went below zero.
    #[error("Available stock must not be negative, got {0}")]
    NegativeAvailable(i64),

    /// Reserved stock went below zero.
    #[error("Reserved stock must not be negative, got {0}")]
    NegativeReserved(i64),
}

/// A stock ledger entry.
///
/// `stock_available` counts units free to promise; `stock_reserved` counts
/// units promised to accepted orders but not yet shipped. Their sum is the
/// total stock owned, which only a confirmation reduces.
///
/// The balance mutators perform plain arithmetic; callers are expected to
/// run the checks in [`crate::stock`] first so neither balance can go
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// The item identifier.
    pub id: ItemId,

    /// Human-readable item name.
    pub name: String,

    /// Units free to promise to new orders.
    pub stock_available: i64,

    /// Units held for accepted orders awaiting confirmation.
    pub stock_reserved: i64,
}

impl Item {
    /// Creates a new ledger entry.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        stock_available: i64,
        stock_reserved: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            stock_available,
            stock_reserved,
        }
    }

    /// Returns the total stock owned (available + reserved).
    pub fn total_stock(&self) -> i64 {
        self.stock_available + self.stock_reserved
    }

    /// Moves stock from available into reserved.
    pub fn reserve(&mut self, quantity: u32) {
        self.stock_available -= quantity as i64;
        self.stock_reserved += quantity as i64;
    }

    /// Returns reserved stock to available.
    pub fn release(&mut self, quantity: u32) {
        self.stock_reserved -= quantity as i64;
        self.stock_available += quantity as i64;
    }

    /// Consumes reserved stock permanently.
    pub fn confirm(&mut self, quantity: u32) {
        self.stock_reserved -= quantity as i64;
    }

    /// Checks the entry's field invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::NameRequired);
        }
        if self.stock_available < 0 {
            return Err(ItemValidationError::NegativeAvailable(self.stock_available));
        }
        if self.stock_reserved < 0 {
            return Err(ItemValidationError::NegativeReserved(self.stock_reserved));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Item {
        Item::new(ItemId::new(1), "Widget", 100, 0)
    }

    #[test]
    fn test_reserve_moves_stock_between_balances() {
        let mut item = widget();
        item.reserve(30);
        assert_eq!(item.stock_available, 70);
        assert_eq!(item.stock_reserved, 30);
        assert_eq!(item.total_stock(), 100);
    }

    #[test]
    fn test_release_restores_available() {
        let mut item = widget();
        item.reserve(30);
        item.release(30);
        assert_eq!(item.stock_available, 100);
        assert_eq!(item.stock_reserved, 0);
    }

    #[test]
    fn test_confirm_reduces_total_stock() {
        let mut item = widget();
        item.reserve(30);
        item.confirm(30);
        assert_eq!(item.stock_available, 70);
        assert_eq!(item.stock_reserved, 0);
        assert_eq!(item.total_stock(), 70);
    }

    #[test]
    fn test_validate_accepts_well_formed_entry() {
        assert!(widget().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let item = Item::new(ItemId::new(1), "   ", 10, 0);
        assert!(matches!(
            item.validate(),
            Err(ItemValidationError::NameRequired)
        ));
    }

    #[test]
    fn test_validate_rejects_negative_balances() {
        let item = Item::new(ItemId::new(1), "Widget", -1, 0);
        assert!(matches!(
            item.validate(),
            Err(ItemValidationError::NegativeAvailable(-1))
        ));

        let item = Item::new(ItemId::new(1), "Widget", 0, -5);
        assert!(matches!(
            item.validate(),
            Err(ItemValidationError::NegativeReserved(-5))
        ));
    }

    #[test]
    fn test_wire_shape_uses_camel_case() {
        let item = Item::new(ItemId::new(5), "Widget", 70, 30);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 5,
                "name": "Widget",
                "stockAvailable": 70,
                "stockReserved": 30,
            })
        );
    }
}
