//! # Transaction Statistics
//!
//! Dashboard totals over a filtered slice of the transaction log.
//!
//! - `total_amount` is net revenue (sales − returns) minus every merchant
//!   withdrawal, i.e. money still in the business.
//! - `total_quantity` counts sale units only.
//! - `total_gift_quantity` counts gift units on sales and gifts.
//! - `current_stock` is derived from the transactions themselves, across
//!   all products.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::inventory::signed_stock_delta;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Transaction, TransactionType};

/// Count, amount and units for one transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TypeStats {
    pub count: i64,
    pub amount: Money,
    pub quantity: Quantity,
}

impl TypeStats {
    fn add(&mut self, tx: &Transaction) {
        self.count += 1;
        self.amount += tx.total_amount;
        self.quantity += tx.quantity;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TypeStatsTable {
    pub purchase: TypeStats,
    pub sale: TypeStats,
    #[serde(rename = "return")]
    pub returned: TypeStats,
    pub gift: TypeStats,
}

impl TypeStatsTable {
    pub fn get(&self, transaction_type: TransactionType) -> &TypeStats {
        match transaction_type {
            TransactionType::Purchase => &self.purchase,
            TransactionType::Sale => &self.sale,
            TransactionType::Return => &self.returned,
            TransactionType::Gift => &self.gift,
        }
    }

    fn get_mut(&mut self, transaction_type: TransactionType) -> &mut TypeStats {
        match transaction_type {
            TransactionType::Purchase => &mut self.purchase,
            TransactionType::Sale => &mut self.sale,
            TransactionType::Return => &mut self.returned,
            TransactionType::Gift => &mut self.gift,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub total_amount: Money,
    pub total_quantity: Quantity,
    pub total_gift_quantity: Quantity,
    pub current_stock: Quantity,
    pub type_stats: TypeStatsTable,
}

/// Computes the dashboard totals.
///
/// `total_withdrawals` is subtracted from the net amount in full; it is not
/// narrowed by whatever filter produced `transactions`.
pub fn transaction_stats(transactions: &[Transaction], total_withdrawals: Money) -> TransactionStats {
    let mut stats = TransactionStats {
        total_transactions: transactions.len() as i64,
        ..Default::default()
    };

    for tx in transactions {
        stats.total_amount += tx.net_revenue();

        match tx.transaction_type {
            TransactionType::Sale => {
                stats.total_quantity += tx.quantity;
                stats.total_gift_quantity += tx.gift_quantity;
            }
            TransactionType::Gift => stats.total_gift_quantity += tx.gift_quantity,
            TransactionType::Purchase | TransactionType::Return => {}
        }

        stats.type_stats.get_mut(tx.transaction_type).add(tx);
        stats.current_stock += signed_stock_delta(tx);
    }

    stats.total_amount -= total_withdrawals;
    stats
}
