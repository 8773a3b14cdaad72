//! # Inventory Rules
//!
//! How a transaction moves stock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchase  ──►  stock + quantity                                        │
//! │  return    ──►  stock + quantity                                        │
//! │  sale      ──►  stock − (quantity + gift_quantity)                      │
//! │  gift      ──►  stock − (quantity + gift_quantity)                      │
//! │                                                                         │
//! │  no product name  ──►  stock untouched                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Record Store applies a movement in the same database transaction as
//! the write that caused it, and logs old and new stock for every change.
//! Editing or deleting a transaction reverses its original movement first.

use chrono::{DateTime, Utc};

use crate::quantity::Quantity;
use crate::types::{InventoryChange, StockChange, Transaction, TransactionType};

/// One stock adjustment for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_name: String,
    pub change_type: StockChange,
    /// Always positive.
    pub quantity: Quantity,
}

impl StockMovement {
    /// The movement that undoes this one.
    pub fn reversed(&self) -> StockMovement {
        StockMovement {
            product_name: self.product_name.clone(),
            change_type: match self.change_type {
                StockChange::Increase => StockChange::Decrease,
                StockChange::Decrease => StockChange::Increase,
            },
            quantity: self.quantity,
        }
    }

    /// Stock after applying this movement to `current`.
    pub fn apply(&self, current: Quantity) -> Quantity {
        match self.change_type {
            StockChange::Increase => current + self.quantity,
            StockChange::Decrease => current - self.quantity,
        }
    }

    /// Builds the log entry for this movement.
    pub fn to_change(
        &self,
        id: String,
        old_stock: Quantity,
        transaction_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> InventoryChange {
        InventoryChange {
            id,
            product_name: self.product_name.clone(),
            change_type: self.change_type,
            quantity_change: self.quantity,
            old_stock,
            new_stock: self.apply(old_stock),
            transaction_id,
            created_at,
        }
    }
}

/// Direction a transaction type moves stock.
pub const fn change_type_for(transaction_type: TransactionType) -> StockChange {
    match transaction_type {
        TransactionType::Purchase | TransactionType::Return => StockChange::Increase,
        TransactionType::Sale | TransactionType::Gift => StockChange::Decrease,
    }
}

/// Units physically moved. Outgoing goods include the gifted units.
pub fn units_moved(tx: &Transaction) -> Quantity {
    match tx.transaction_type {
        TransactionType::Purchase | TransactionType::Return => tx.quantity,
        TransactionType::Sale | TransactionType::Gift => tx.quantity + tx.gift_quantity,
    }
}

/// Signed stock effect of a transaction, whether or not it names a product.
pub fn signed_stock_delta(tx: &Transaction) -> Quantity {
    let units = units_moved(tx);
    match change_type_for(tx.transaction_type) {
        StockChange::Increase => units,
        StockChange::Decrease => Quantity::zero() - units,
    }
}

/// The movement a transaction causes, if any.
///
/// `None` when the transaction has no product or moves no units.
pub fn stock_movement(tx: &Transaction) -> Option<StockMovement> {
    let product_name = tx.product_name.as_deref()?.trim();
    if product_name.is_empty() {
        return None;
    }

    let quantity = units_moved(tx);
    if quantity <= Quantity::zero() {
        return None;
    }

    Some(StockMovement {
        product_name: product_name.to_string(),
        change_type: change_type_for(tx.transaction_type),
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn tx(kind: TransactionType, product: Option<&str>, units: i64, gift_units: i64) -> Transaction {
        Transaction {
            id: "t1".to_string(),
            transaction_type: kind,
            customer_name: "Li Si".to_string(),
            product_name: product.map(str::to_string),
            collector: "Boss".to_string(),
            quantity: Quantity::from_units(units),
            gift_quantity: Quantity::from_units(gift_units),
            unit_price: Money::zero(),
            total_amount: Money::zero(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_direction_by_type() {
        let purchase = stock_movement(&tx(TransactionType::Purchase, Some("Rice"), 100, 0)).unwrap();
        assert_eq!(purchase.change_type, StockChange::Increase);
        assert_eq!(purchase.quantity, Quantity::from_units(100));

        let ret = stock_movement(&tx(TransactionType::Return, Some("Rice"), 5, 3)).unwrap();
        assert_eq!(ret.change_type, StockChange::Increase);
        // returned goods ignore gift units
        assert_eq!(ret.quantity, Quantity::from_units(5));
    }

    #[test]
    fn test_outgoing_includes_gift_units() {
        let sale = stock_movement(&tx(TransactionType::Sale, Some("Rice"), 10, 2)).unwrap();
        assert_eq!(sale.change_type, StockChange::Decrease);
        assert_eq!(sale.quantity, Quantity::from_units(12));

        let gift = stock_movement(&tx(TransactionType::Gift, Some("Rice"), 0, 4)).unwrap();
        assert_eq!(gift.quantity, Quantity::from_units(4));
    }

    #[test]
    fn test_no_product_or_no_units_means_no_movement() {
        assert!(stock_movement(&tx(TransactionType::Sale, None, 10, 0)).is_none());
        assert!(stock_movement(&tx(TransactionType::Sale, Some("  "), 10, 0)).is_none());
        assert!(stock_movement(&tx(TransactionType::Purchase, Some("Rice"), 0, 5)).is_none());
    }

    #[test]
    fn test_apply_and_reverse() {
        let sale = stock_movement(&tx(TransactionType::Sale, Some("Rice"), 10, 2)).unwrap();
        let after = sale.apply(Quantity::from_units(50));
        assert_eq!(after, Quantity::from_units(38));
        assert_eq!(sale.reversed().apply(after), Quantity::from_units(50));
    }

    #[test]
    fn test_change_log_entry() {
        let purchase = stock_movement(&tx(TransactionType::Purchase, Some("Rice"), 100, 0)).unwrap();
        let change = purchase.to_change("c1".to_string(), Quantity::from_units(7), Some("t1".to_string()), Utc::now());
        assert_eq!(change.old_stock, Quantity::from_units(7));
        assert_eq!(change.new_stock, Quantity::from_units(107));
        assert_eq!(change.transaction_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_stock_delta(&tx(TransactionType::Sale, None, 10, 2)), Quantity::from_units(-12));
        assert_eq!(signed_stock_delta(&tx(TransactionType::Return, None, 3, 0)), Quantity::from_units(3));
    }
}
