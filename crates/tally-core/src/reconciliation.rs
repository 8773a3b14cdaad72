//! # Payment Reconciliation
//!
//! Who is holding how much of the shop's money.
//!
//! ## Money Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   customer ──sale──► employee ──transfer──► merchant ──withdraw──► 💵  │
//! │   customer ◄─return─ employee                                          │
//! │                                                                         │
//! │   employee.current_balance = Σ(sale) − Σ(return) − Σ(own transfers)    │
//! │                                                                         │
//! │   merchant.current_balance = Σ(sale) − Σ(return)                        │
//! │                              + Σ(ALL employee transfers)                │
//! │                              − Σ(ALL withdrawals)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Who Counts as the Merchant?
//! The collector's employee record decides: `merchant`, `manager` and
//! `admin` roles use the merchant formula. A collector with no employee
//! record is treated as an employee. Display names are never matched
//! against fixed strings.
//!
//! Purchases and gifts still count toward `transaction_count` but never
//! move money.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::session::Role;
use crate::types::{Employee, Transaction, Transfer, Withdrawal};

// =============================================================================
// Filter
// =============================================================================

/// Narrows the reconciliation.
///
/// The date range applies to transactions only; transfers and withdrawals
/// are always counted in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentFilter {
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
}

impl PaymentFilter {
    pub fn for_employee(name: impl Into<String>) -> Self {
        PaymentFilter {
            employee_name: Some(name.into()),
            ..Default::default()
        }
    }

    fn matches(&self, tx: &Transaction) -> bool {
        self.employee_name.as_ref().map_or(true, |n| &tx.collector == n)
            && self.start.map_or(true, |s| tx.created_at >= s)
            && self.end.map_or(true, |e| tx.created_at <= e)
    }
}

// =============================================================================
// Employee Balance
// =============================================================================

/// Money one collector has taken in and passed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeBalance {
    pub employee_name: String,
    /// Whether the merchant formula was applied.
    pub is_merchant: bool,
    /// Net collections. For the merchant this also includes every transfer
    /// received from employees.
    pub total_amount: Money,
    /// Transfers this employee made. Always zero for the merchant.
    pub total_transferred: Money,
    /// Withdrawals. Always zero for employees.
    pub total_withdrawn: Money,
    pub current_balance: Money,
    pub transaction_count: i64,
    /// Transfer history recorded under this name, newest first.
    pub transfers: Vec<Transfer>,
}

/// Σ of withdrawals, optionally for one merchant name only.
pub fn total_withdrawals(withdrawals: &[Withdrawal], merchant_name: Option<&str>) -> Money {
    withdrawals
        .iter()
        .filter(|w| merchant_name.map_or(true, |name| w.merchant_name == name))
        .map(|w| w.amount)
        .sum()
}

/// Balances for every collector that appears in the (filtered) transactions.
///
/// Keyed by collector name.
pub fn employee_payment_stats(
    transactions: &[Transaction],
    employees: &[Employee],
    transfers: &[Transfer],
    withdrawals: &[Withdrawal],
    filter: &PaymentFilter,
) -> BTreeMap<String, EmployeeBalance> {
    let roles: HashMap<&str, Role> = employees.iter().map(|e| (e.name.as_str(), e.role)).collect();

    let mut collected: BTreeMap<&str, (Money, i64)> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| filter.matches(tx)) {
        let entry = collected.entry(tx.collector.as_str()).or_insert((Money::zero(), 0));
        entry.0 += tx.net_revenue();
        entry.1 += 1;
    }

    let all_transfers: Money = transfers.iter().map(|t| t.amount).sum();
    let all_withdrawals = total_withdrawals(withdrawals, None);

    collected
        .into_iter()
        .map(|(collector, (net_collections, transaction_count))| {
            let is_merchant = roles.get(collector).map_or(false, Role::is_privileged);

            let mut own_transfers: Vec<Transfer> = transfers
                .iter()
                .filter(|t| t.employee_name == collector)
                .cloned()
                .collect();
            own_transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let balance = if is_merchant {
                let total_amount = net_collections + all_transfers;
                EmployeeBalance {
                    employee_name: collector.to_string(),
                    is_merchant,
                    total_amount,
                    total_transferred: Money::zero(),
                    total_withdrawn: all_withdrawals,
                    current_balance: total_amount - all_withdrawals,
                    transaction_count,
                    transfers: own_transfers,
                }
            } else {
                let total_transferred: Money = own_transfers.iter().map(|t| t.amount).sum();
                EmployeeBalance {
                    employee_name: collector.to_string(),
                    is_merchant,
                    total_amount: net_collections,
                    total_transferred,
                    total_withdrawn: Money::zero(),
                    current_balance: net_collections - total_transferred,
                    transaction_count,
                    transfers: own_transfers,
                }
            };

            (collector.to_string(), balance)
        })
        .collect()
}

/// All balances as a list, largest balance first.
pub fn all_employees_summary(stats: BTreeMap<String, EmployeeBalance>) -> Vec<EmployeeBalance> {
    let mut summary: Vec<EmployeeBalance> = stats.into_values().collect();
    summary.sort_by(|a, b| {
        b.current_balance
            .cmp(&a.current_balance)
            .then_with(|| a.employee_name.cmp(&b.employee_name))
    });
    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
